//! Column-major 4x4 matrix math over caller-supplied `f64` buffers.
//!
//! A matrix occupies 16 consecutive values starting at an offset:
//!
//! ```text
//!  m[o +  0] m[o +  4] m[o +  8] m[o + 12]
//!  m[o +  1] m[o +  5] m[o +  9] m[o + 13]
//!  m[o +  2] m[o +  6] m[o + 10] m[o + 14]
//!  m[o +  3] m[o +  7] m[o + 11] m[o + 15]
//! ```
//!
//! A vector occupies 4 consecutive values. Every public function checks that
//! each block fits its buffer and returns [`MatrixError`] before writing
//! anything, so a failed call never leaves a half-written result.
//!
//! The kernels at the bottom of this module (and in [`rotation`] and
//! [`projection`]) work on already validated 16-value slices and are shared
//! with the [`Matrix4`](crate::Matrix4) value type.

mod projection;
mod rotation;

pub use projection::{frustum_m, ortho_m, perspective_m, set_look_at_m};
pub use rotation::{rotate_m, rotate_m_in_place, set_rotate_euler_m, set_rotate_m};

pub(crate) use projection::{frustum, look_at, ortho, perspective};
pub(crate) use rotation::{euler_rotation, rotation};

use crate::error::MatrixError;

/// Number of values in a 4x4 matrix block.
pub const MATRIX_LEN: usize = 16;
/// Number of values in a 4-component vector block.
pub const VECTOR_LEN: usize = 4;

/// Where an input of [`multiply_mm`] or [`multiply_mv`] is read from.
///
/// Reading from the destination buffer is how a product is computed in place:
/// `multiply_mm(m, 0, Operand::Dest(0), Operand::Slice(&r, 0))` replaces `m`
/// with `m x r`. The destination ranges may overlap the result block fully or
/// partially.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// The block at this offset inside the destination buffer.
    Dest(usize),
    /// The block at this offset inside a separate buffer.
    Slice(&'a [f64], usize),
}

impl<'a> Operand<'a> {
    fn check(&self, name: &'static str, dest_len: usize, size: usize) -> Result<(), MatrixError> {
        match *self {
            Operand::Dest(offset) => check_block(name, dest_len, offset, size),
            Operand::Slice(buf, offset) => check_block(name, buf.len(), offset, size),
        }
    }

    /// Whether this operand shares any value with the result block.
    fn overlaps(&self, size: usize, result_offset: usize, result_size: usize) -> bool {
        match *self {
            Operand::Dest(offset) => {
                offset < result_offset + result_size && result_offset < offset + size
            }
            Operand::Slice(..) => false,
        }
    }

    fn view<'b>(self, dest: &'b [f64], size: usize) -> &'b [f64]
    where
        'a: 'b,
    {
        match self {
            Operand::Dest(offset) => &dest[offset..offset + size],
            Operand::Slice(buf, offset) => &buf[offset..offset + size],
        }
    }

    /// Resolves a non-overlapping operand against the destination split
    /// around the result block (`head` ends where the result starts, `tail`
    /// begins at `tail_start`).
    fn split_view<'b>(
        self,
        head: &'b [f64],
        tail: &'b [f64],
        tail_start: usize,
        size: usize,
    ) -> &'b [f64]
    where
        'a: 'b,
    {
        match self {
            Operand::Dest(offset) if offset < tail_start => &head[offset..offset + size],
            Operand::Dest(offset) => &tail[offset - tail_start..offset - tail_start + size],
            Operand::Slice(buf, offset) => &buf[offset..offset + size],
        }
    }
}

pub(crate) fn check_block(
    name: &'static str,
    len: usize,
    offset: usize,
    size: usize,
) -> Result<(), MatrixError> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(MatrixError::BufferTooShort {
            name,
            offset,
            len,
            required: size,
        }),
    }
}

/// Multiplies two 4x4 matrices: `result = lhs x rhs`.
///
/// Applying the result to a vector has the same effect as applying `rhs`
/// first, then `lhs`.
///
/// Either operand may live in the destination buffer, overlapping the result
/// block or not. Overlapping products are accumulated in a stack scratch block
/// and copied into place afterwards; both paths perform the same arithmetic in
/// the same order, so the output is bit-identical either way.
pub fn multiply_mm(
    result: &mut [f64],
    result_offset: usize,
    lhs: Operand<'_>,
    rhs: Operand<'_>,
) -> Result<(), MatrixError> {
    check_block("result", result.len(), result_offset, MATRIX_LEN)?;
    lhs.check("lhs", result.len(), MATRIX_LEN)?;
    rhs.check("rhs", result.len(), MATRIX_LEN)?;

    let aliased = lhs.overlaps(MATRIX_LEN, result_offset, MATRIX_LEN)
        || rhs.overlaps(MATRIX_LEN, result_offset, MATRIX_LEN);

    if aliased {
        let mut scratch = [0.0; MATRIX_LEN];
        mul_mm(
            &mut scratch,
            lhs.view(result, MATRIX_LEN),
            rhs.view(result, MATRIX_LEN),
        );
        result[result_offset..result_offset + MATRIX_LEN].copy_from_slice(&scratch);
    } else {
        let tail_start = result_offset + MATRIX_LEN;
        let (head, rest) = result.split_at_mut(result_offset);
        let (out, tail) = rest.split_at_mut(MATRIX_LEN);
        let head: &[f64] = head;
        let tail: &[f64] = tail;
        mul_mm(
            out,
            lhs.split_view(head, tail, tail_start, MATRIX_LEN),
            rhs.split_view(head, tail, tail_start, MATRIX_LEN),
        );
    }
    Ok(())
}

/// Multiplies a 4-component column vector by a 4x4 matrix: `result = lhs x rhs`.
///
/// All four output components are computed before any is written, so the
/// result may overlap either input.
pub fn multiply_mv(
    result: &mut [f64],
    result_offset: usize,
    lhs: Operand<'_>,
    rhs: Operand<'_>,
) -> Result<(), MatrixError> {
    check_block("result", result.len(), result_offset, VECTOR_LEN)?;
    lhs.check("lhs", result.len(), MATRIX_LEN)?;
    rhs.check("rhs", result.len(), VECTOR_LEN)?;

    let product = mul_mv(lhs.view(result, MATRIX_LEN), rhs.view(result, VECTOR_LEN));
    result[result_offset..result_offset + VECTOR_LEN].copy_from_slice(&product);
    Ok(())
}

/// Writes the transpose of `source` into `result`.
pub fn transpose_m(
    result: &mut [f64],
    result_offset: usize,
    source: &[f64],
    source_offset: usize,
) -> Result<(), MatrixError> {
    check_block("result", result.len(), result_offset, MATRIX_LEN)?;
    check_block("source", source.len(), source_offset, MATRIX_LEN)?;
    transpose(
        &mut result[result_offset..result_offset + MATRIX_LEN],
        &source[source_offset..source_offset + MATRIX_LEN],
    );
    Ok(())
}

/// Inverts a general 4x4 matrix with the adjugate (Cramer's rule) method.
///
/// Returns `Ok(false)` when the determinant is exactly zero; `result` is left
/// untouched in that case.
pub fn invert_m(
    result: &mut [f64],
    result_offset: usize,
    source: &[f64],
    source_offset: usize,
) -> Result<bool, MatrixError> {
    check_block("result", result.len(), result_offset, MATRIX_LEN)?;
    check_block("source", source.len(), source_offset, MATRIX_LEN)?;
    match invert(&source[source_offset..source_offset + MATRIX_LEN]) {
        Some(inverse) => {
            result[result_offset..result_offset + MATRIX_LEN].copy_from_slice(&inverse);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Sets the matrix at `offset` to the identity.
pub fn set_identity_m(m: &mut [f64], offset: usize) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    identity(&mut m[offset..offset + MATRIX_LEN]);
    Ok(())
}

/// Scales the basis columns of `source` by `x`, `y`, `z` into `result`.
///
/// The translation column is copied unchanged.
pub fn scale_m(
    result: &mut [f64],
    result_offset: usize,
    source: &[f64],
    source_offset: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("result", result.len(), result_offset, MATRIX_LEN)?;
    check_block("source", source.len(), source_offset, MATRIX_LEN)?;
    scale(
        &mut result[result_offset..result_offset + MATRIX_LEN],
        &source[source_offset..source_offset + MATRIX_LEN],
        x,
        y,
        z,
    );
    Ok(())
}

/// Scales the basis columns of the matrix at `offset` in place.
pub fn scale_m_in_place(
    m: &mut [f64],
    offset: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    scale_in_place(&mut m[offset..offset + MATRIX_LEN], x, y, z);
    Ok(())
}

/// Translates `source` by `(x, y, z)` expressed in its own local axes.
///
/// The basis columns are copied verbatim; the translation column becomes
/// `t + B * (x, y, z)`.
pub fn translate_m(
    result: &mut [f64],
    result_offset: usize,
    source: &[f64],
    source_offset: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("result", result.len(), result_offset, MATRIX_LEN)?;
    check_block("source", source.len(), source_offset, MATRIX_LEN)?;
    translate(
        &mut result[result_offset..result_offset + MATRIX_LEN],
        &source[source_offset..source_offset + MATRIX_LEN],
        x,
        y,
        z,
    );
    Ok(())
}

/// Translates the matrix at `offset` in place, in its own local axes.
pub fn translate_m_in_place(
    m: &mut [f64],
    offset: usize,
    x: f64,
    y: f64,
    z: f64,
) -> Result<(), MatrixError> {
    check_block("m", m.len(), offset, MATRIX_LEN)?;
    translate_in_place(&mut m[offset..offset + MATRIX_LEN], x, y, z);
    Ok(())
}

/// Euclidean length of `(x, y, z)`.
pub fn vector_length(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

// Kernels. Callers guarantee every slice holds exactly one block.

pub(crate) fn mul_mm(out: &mut [f64], lhs: &[f64], rhs: &[f64]) {
    for i in 0..4 {
        let rhs_i0 = rhs[4 * i];
        let mut ri0 = lhs[0] * rhs_i0;
        let mut ri1 = lhs[1] * rhs_i0;
        let mut ri2 = lhs[2] * rhs_i0;
        let mut ri3 = lhs[3] * rhs_i0;
        for j in 1..4 {
            let rhs_ij = rhs[4 * i + j];
            ri0 += lhs[4 * j] * rhs_ij;
            ri1 += lhs[4 * j + 1] * rhs_ij;
            ri2 += lhs[4 * j + 2] * rhs_ij;
            ri3 += lhs[4 * j + 3] * rhs_ij;
        }
        out[4 * i] = ri0;
        out[4 * i + 1] = ri1;
        out[4 * i + 2] = ri2;
        out[4 * i + 3] = ri3;
    }
}

pub(crate) fn mul_mv(m: &[f64], v: &[f64]) -> [f64; VECTOR_LEN] {
    let mut out = [0.0; VECTOR_LEN];
    for (row, value) in out.iter_mut().enumerate() {
        *value = m[row] * v[0] + m[4 + row] * v[1] + m[8 + row] * v[2] + m[12 + row] * v[3];
    }
    out
}

pub(crate) fn transpose(out: &mut [f64], m: &[f64]) {
    for i in 0..4 {
        let base = i * 4;
        out[i] = m[base];
        out[i + 4] = m[base + 1];
        out[i + 8] = m[base + 2];
        out[i + 12] = m[base + 3];
    }
}

pub(crate) fn identity(out: &mut [f64]) {
    out.fill(0.0);
    for i in (0..MATRIX_LEN).step_by(5) {
        out[i] = 1.0;
    }
}

pub(crate) fn scale(out: &mut [f64], m: &[f64], x: f64, y: f64, z: f64) {
    for i in 0..4 {
        out[i] = m[i] * x;
        out[4 + i] = m[4 + i] * y;
        out[8 + i] = m[8 + i] * z;
        out[12 + i] = m[12 + i];
    }
}

pub(crate) fn scale_in_place(m: &mut [f64], x: f64, y: f64, z: f64) {
    for i in 0..4 {
        m[i] *= x;
        m[4 + i] *= y;
        m[8 + i] *= z;
    }
}

pub(crate) fn translate(out: &mut [f64], m: &[f64], x: f64, y: f64, z: f64) {
    out[..12].copy_from_slice(&m[..12]);
    for i in 0..4 {
        out[12 + i] = m[i] * x + m[4 + i] * y + m[8 + i] * z + m[12 + i];
    }
}

pub(crate) fn translate_in_place(m: &mut [f64], x: f64, y: f64, z: f64) {
    for i in 0..4 {
        m[12 + i] += m[i] * x + m[4 + i] * y + m[8 + i] * z;
    }
}

/// Adjugate inverse; `None` when the determinant is exactly zero.
pub(crate) fn invert(m: &[f64]) -> Option<[f64; MATRIX_LEN]> {
    // Work on the transpose so the cofactor expressions read row-wise.
    let mut s = [0.0; MATRIX_LEN];
    transpose(&mut s, m);

    // Pairs for the first eight cofactors.
    let a = [
        s[10] * s[15],
        s[11] * s[14],
        s[9] * s[15],
        s[11] * s[13],
        s[9] * s[14],
        s[10] * s[13],
        s[8] * s[15],
        s[11] * s[12],
        s[8] * s[14],
        s[10] * s[12],
        s[8] * s[13],
        s[9] * s[12],
    ];

    let mut d = [0.0; MATRIX_LEN];
    d[0] = (a[0] * s[5] + a[3] * s[6] + a[4] * s[7]) - (a[1] * s[5] + a[2] * s[6] + a[5] * s[7]);
    d[1] = (a[1] * s[4] + a[6] * s[6] + a[9] * s[7]) - (a[0] * s[4] + a[7] * s[6] + a[8] * s[7]);
    d[2] = (a[2] * s[4] + a[7] * s[5] + a[10] * s[7]) - (a[3] * s[4] + a[6] * s[5] + a[11] * s[7]);
    d[3] = (a[5] * s[4] + a[8] * s[5] + a[11] * s[6]) - (a[4] * s[4] + a[9] * s[5] + a[10] * s[6]);
    d[4] = (a[1] * s[1] + a[2] * s[2] + a[5] * s[3]) - (a[0] * s[1] + a[3] * s[2] + a[4] * s[3]);
    d[5] = (a[0] * s[0] + a[7] * s[2] + a[8] * s[3]) - (a[1] * s[0] + a[6] * s[2] + a[9] * s[3]);
    d[6] = (a[3] * s[0] + a[6] * s[1] + a[11] * s[3]) - (a[2] * s[0] + a[7] * s[1] + a[10] * s[3]);
    d[7] = (a[4] * s[0] + a[9] * s[1] + a[10] * s[2]) - (a[5] * s[0] + a[8] * s[1] + a[11] * s[2]);

    // Pairs for the second eight cofactors.
    let b = [
        s[2] * s[7],
        s[3] * s[6],
        s[1] * s[7],
        s[3] * s[5],
        s[1] * s[6],
        s[2] * s[5],
        s[0] * s[7],
        s[3] * s[4],
        s[0] * s[6],
        s[2] * s[4],
        s[0] * s[5],
        s[1] * s[4],
    ];

    d[8] = (b[0] * s[13] + b[3] * s[14] + b[4] * s[15])
        - (b[1] * s[13] + b[2] * s[14] + b[5] * s[15]);
    d[9] = (b[1] * s[12] + b[6] * s[14] + b[9] * s[15])
        - (b[0] * s[12] + b[7] * s[14] + b[8] * s[15]);
    d[10] = (b[2] * s[12] + b[7] * s[13] + b[10] * s[15])
        - (b[3] * s[12] + b[6] * s[13] + b[11] * s[15]);
    d[11] = (b[5] * s[12] + b[8] * s[13] + b[11] * s[14])
        - (b[4] * s[12] + b[9] * s[13] + b[10] * s[14]);
    d[12] = (b[2] * s[10] + b[5] * s[11] + b[1] * s[9])
        - (b[4] * s[11] + b[0] * s[9] + b[3] * s[10]);
    d[13] = (b[8] * s[11] + b[0] * s[8] + b[7] * s[10])
        - (b[6] * s[10] + b[9] * s[11] + b[1] * s[8]);
    d[14] = (b[6] * s[9] + b[11] * s[11] + b[3] * s[8])
        - (b[10] * s[11] + b[2] * s[8] + b[7] * s[9]);
    d[15] = (b[10] * s[10] + b[4] * s[8] + b[9] * s[9])
        - (b[8] * s[9] + b[11] * s[10] + b[5] * s[8]);

    let det = s[0] * d[0] + s[1] * d[1] + s[2] * d[2] + s[3] * d[3];
    if det == 0.0 {
        return None;
    }

    let inv_det = 1.0 / det;
    for value in &mut d {
        *value *= inv_det;
    }
    Some(d)
}
