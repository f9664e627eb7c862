//! Axis-angle and Euler rotation builders.

use super::{check_block, multiply_mm, Operand, MATRIX_LEN};
use crate::error::MatrixError;

/// Builds a rotation-only matrix for `degrees` around `(x, y, z)`.
///
/// Rotations about a unit basis axis take a closed-form path. Any other axis
/// is normalized (unless it already has length 1) and fed through the general
/// axis-angle formula.
pub fn set_rotate_m(
    rm: &mut [f64],
    offset: usize,
    degrees: f64,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("rm", rm.len(), offset, MATRIX_LEN)?;
    rotation(&mut rm[offset..offset + MATRIX_LEN], degrees, x, y, z);
    Ok(())
}

/// Rotates `source` by `degrees` around `(x, y, z)`: `result = source x R`.
pub fn rotate_m(
    result: &mut [f64],
    result_offset: usize,
    source: Operand<'_>,
    degrees: f64,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    let mut r = [0.0; MATRIX_LEN];
    rotation(&mut r, degrees, x, y, z);
    multiply_mm(result, result_offset, source, Operand::Slice(&r, 0))
}

/// Rotates the matrix at `offset` in place.
pub fn rotate_m_in_place(
    m: &mut [f64],
    offset: usize,
    degrees: f64,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    rotate_m(m, offset, Operand::Dest(offset), degrees, x, y, z)
}

/// Builds a rotation matrix from Euler angles in degrees about X, Y and Z.
pub fn set_rotate_euler_m(
    rm: &mut [f64],
    offset: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("rm", rm.len(), offset, MATRIX_LEN)?;
    euler_rotation(&mut rm[offset..offset + MATRIX_LEN], x, y, z);
    Ok(())
}

/// Largest quarter-turn count an `i64` holds with every integer representable.
const EXACT_QUARTER_TURNS: f64 = 9_007_199_254_740_992.0;

/// Sine and cosine of an angle in degrees, exact at whole quarter turns.
pub(crate) fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let quarter_turns = degrees / 90.0;
    if quarter_turns.abs() <= EXACT_QUARTER_TURNS && quarter_turns.fract() == 0.0 {
        match (quarter_turns as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        degrees.to_radians().sin_cos()
    }
}

pub(crate) fn rotation(rm: &mut [f64], degrees: f64, mut x: f64, mut y: f64, mut z: f64) {
    rm[3] = 0.0;
    rm[7] = 0.0;
    rm[11] = 0.0;
    rm[12] = 0.0;
    rm[13] = 0.0;
    rm[14] = 0.0;
    rm[15] = 1.0;

    let (s, c) = sin_cos_degrees(degrees);
    if x == 1.0 && y == 0.0 && z == 0.0 {
        rm[0] = 1.0;
        rm[1] = 0.0;
        rm[2] = 0.0;
        rm[4] = 0.0;
        rm[5] = c;
        rm[6] = s;
        rm[8] = 0.0;
        rm[9] = -s;
        rm[10] = c;
    } else if x == 0.0 && y == 1.0 && z == 0.0 {
        rm[0] = c;
        rm[1] = 0.0;
        rm[2] = -s;
        rm[4] = 0.0;
        rm[5] = 1.0;
        rm[6] = 0.0;
        rm[8] = s;
        rm[9] = 0.0;
        rm[10] = c;
    } else if x == 0.0 && y == 0.0 && z == 1.0 {
        rm[0] = c;
        rm[1] = s;
        rm[2] = 0.0;
        rm[4] = -s;
        rm[5] = c;
        rm[6] = 0.0;
        rm[8] = 0.0;
        rm[9] = 0.0;
        rm[10] = 1.0;
    } else {
        let len = super::vector_length(x, y, z);
        if len != 1.0 {
            let recip = 1.0 / len;
            x *= recip;
            y *= recip;
            z *= recip;
        }
        let nc = 1.0 - c;
        let xy = x * y;
        let yz = y * z;
        let zx = z * x;
        let xs = x * s;
        let ys = y * s;
        let zs = z * s;
        rm[0] = x * x * nc + c;
        rm[4] = xy * nc - zs;
        rm[8] = zx * nc + ys;
        rm[1] = xy * nc + zs;
        rm[5] = y * y * nc + c;
        rm[9] = yz * nc - xs;
        rm[2] = zx * nc - ys;
        rm[6] = yz * nc + xs;
        rm[10] = z * z * nc + c;
    }
}

pub(crate) fn euler_rotation(rm: &mut [f64], x: f64, y: f64, z: f64) {
    let (sx, cx) = sin_cos_degrees(x);
    let (sy, cy) = sin_cos_degrees(y);
    let (sz, cz) = sin_cos_degrees(z);
    let cxsy = cx * sy;
    let sxsy = sx * sy;

    rm[0] = cy * cz;
    rm[1] = -cy * sz;
    rm[2] = sy;
    rm[3] = 0.0;

    rm[4] = sxsy * cz + cx * sz;
    rm[5] = -sxsy * sz + cx * cz;
    rm[6] = -sx * cy;
    rm[7] = 0.0;

    rm[8] = -cxsy * cz + sx * sz;
    rm[9] = cxsy * sz + sx * cz;
    rm[10] = cx * cy;
    rm[11] = 0.0;

    rm[12] = 0.0;
    rm[13] = 0.0;
    rm[14] = 0.0;
    rm[15] = 1.0;
}
