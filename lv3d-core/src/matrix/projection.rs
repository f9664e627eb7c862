//! Camera and projection builders.

use super::{check_block, translate_in_place, vector_length, MATRIX_LEN};
use crate::error::MatrixError;

/// Orthographic projection for the box `[left, right] x [bottom, top] x [near, far]`.
pub fn ortho_m(
    m: &mut [f64],
    offset: usize,
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    near: f64,
    far: f64,
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    ortho(&mut m[offset..offset + MATRIX_LEN], left, right, bottom, top, near, far)
}

/// Perspective projection defined by six clip planes.
///
/// Both `near` and `far` must be positive distances in front of the eye.
pub fn frustum_m(
    m: &mut [f64],
    offset: usize,
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    near: f64,
    far: f64,
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    frustum(&mut m[offset..offset + MATRIX_LEN], left, right, bottom, top, near, far)
}

/// Symmetric perspective projection from a vertical field of view in degrees.
///
/// Unlike [`frustum_m`] the clip planes are not checked: `z_near == z_far`
/// produces non-finite entries.
pub fn perspective_m(
    m: &mut [f64],
    offset: usize,
    fov_y: f64,
    aspect: f64,
    z_near: f64,
    z_far: f64,
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    perspective(&mut m[offset..offset + MATRIX_LEN], fov_y, aspect, z_near, z_far);
    Ok(())
}

/// Right-handed view matrix looking from `eye` towards `center`.
///
/// The rotation part is built from the forward, right and true-up vectors;
/// the eye translation is then applied in those local axes.
pub fn set_look_at_m(
    m: &mut [f64],
    offset: usize,
    eye: [f64; 3],
    center: [f64; 3],
    up: [f64; 3],
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    look_at(&mut m[offset..offset + MATRIX_LEN], eye, center, up);
    Ok(())
}

pub(crate) fn ortho(
    m: &mut [f64],
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    near: f64,
    far: f64,
) -> Result<(), MatrixError> {
    if left == right {
        return Err(MatrixError::DegenerateProjection("left == right"));
    }
    if bottom == top {
        return Err(MatrixError::DegenerateProjection("bottom == top"));
    }
    if near == far {
        return Err(MatrixError::DegenerateProjection("near == far"));
    }

    let r_width = 1.0 / (right - left);
    let r_height = 1.0 / (top - bottom);
    let r_depth = 1.0 / (far - near);

    m.fill(0.0);
    m[0] = 2.0 * r_width;
    m[5] = 2.0 * r_height;
    m[10] = -2.0 * r_depth;
    m[12] = -(right + left) * r_width;
    m[13] = -(top + bottom) * r_height;
    m[14] = -(far + near) * r_depth;
    m[15] = 1.0;
    Ok(())
}

pub(crate) fn frustum(
    m: &mut [f64],
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    near: f64,
    far: f64,
) -> Result<(), MatrixError> {
    if left == right {
        return Err(MatrixError::DegenerateProjection("left == right"));
    }
    if top == bottom {
        return Err(MatrixError::DegenerateProjection("bottom == top"));
    }
    if near == far {
        return Err(MatrixError::DegenerateProjection("near == far"));
    }
    if near <= 0.0 {
        return Err(MatrixError::DegenerateProjection("near <= 0"));
    }
    if far <= 0.0 {
        return Err(MatrixError::DegenerateProjection("far <= 0"));
    }

    let r_width = 1.0 / (right - left);
    let r_height = 1.0 / (top - bottom);
    let r_depth = 1.0 / (near - far);

    m.fill(0.0);
    m[0] = 2.0 * (near * r_width);
    m[5] = 2.0 * (near * r_height);
    m[8] = (right + left) * r_width;
    m[9] = (top + bottom) * r_height;
    m[10] = (far + near) * r_depth;
    m[11] = -1.0;
    m[14] = 2.0 * (far * near * r_depth);
    Ok(())
}

pub(crate) fn perspective(m: &mut [f64], fov_y: f64, aspect: f64, z_near: f64, z_far: f64) {
    let f = 1.0 / (fov_y * (std::f64::consts::PI / 360.0)).tan();
    let range_reciprocal = 1.0 / (z_near - z_far);

    m.fill(0.0);
    m[0] = f / aspect;
    m[5] = f;
    m[10] = (z_far + z_near) * range_reciprocal;
    m[11] = -1.0;
    m[14] = 2.0 * z_far * z_near * range_reciprocal;
}

pub(crate) fn look_at(m: &mut [f64], eye: [f64; 3], center: [f64; 3], up: [f64; 3]) {
    let [ex, ey, ez] = eye;
    let [ux_hint, uy_hint, uz_hint] = up;

    // Forward.
    let mut fx = center[0] - ex;
    let mut fy = center[1] - ey;
    let mut fz = center[2] - ez;
    let rlf = 1.0 / vector_length(fx, fy, fz);
    fx *= rlf;
    fy *= rlf;
    fz *= rlf;

    // Right = forward x up.
    let mut sx = fy * uz_hint - fz * uy_hint;
    let mut sy = fz * ux_hint - fx * uz_hint;
    let mut sz = fx * uy_hint - fy * ux_hint;
    let rls = 1.0 / vector_length(sx, sy, sz);
    sx *= rls;
    sy *= rls;
    sz *= rls;

    // True up = right x forward.
    let ux = sy * fz - sz * fy;
    let uy = sz * fx - sx * fz;
    let uz = sx * fy - sy * fx;

    m[0] = sx;
    m[1] = ux;
    m[2] = -fx;
    m[3] = 0.0;

    m[4] = sy;
    m[5] = uy;
    m[6] = -fy;
    m[7] = 0.0;

    m[8] = sz;
    m[9] = uz;
    m[10] = -fz;
    m[11] = 0.0;

    m[12] = 0.0;
    m[13] = 0.0;
    m[14] = 0.0;
    m[15] = 1.0;

    translate_in_place(m, -ex, -ey, -ez);
}
