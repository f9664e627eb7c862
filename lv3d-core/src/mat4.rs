/// Owned matrix and vector values built on the buffer functions in [`crate::matrix`]
use std::ops::Mul;

use crate::error::MatrixError;
use crate::matrix::{self, MATRIX_LEN, VECTOR_LEN};

/// Column-major 4x4 `f64` transform.
///
/// Affine transforms keep `(0, 0, 0, 1)` as their last row; projection
/// matrices do not, which is how they encode the perspective divide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    data: [f64; MATRIX_LEN],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, // col 0
            0.0, 1.0, 0.0, 0.0, // col 1
            0.0, 0.0, 1.0, 0.0, // col 2
            0.0, 0.0, 0.0, 1.0, // col 3
        ],
    };

    /// Wraps 16 values already laid out column-major.
    pub const fn new(data: [f64; MATRIX_LEN]) -> Self {
        Self { data }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Rotation of `degrees` around the axis `(x, y, z)`.
    pub fn rotation(degrees: f64, x: f64, y: f64, z: f64) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::rotation(&mut data, degrees, x, y, z);
        Self { data }
    }

    /// Rotation from Euler angles in degrees.
    pub fn rotation_euler(x: f64, y: f64, z: f64) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::euler_rotation(&mut data, x, y, z);
        Self { data }
    }

    /// View matrix looking from `eye` at `center`.
    pub fn look_at(eye: [f64; 3], center: [f64; 3], up: [f64; 3]) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::look_at(&mut data, eye, center, up);
        Self { data }
    }

    pub fn ortho(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, MatrixError> {
        let mut data = [0.0; MATRIX_LEN];
        matrix::ortho(&mut data, left, right, bottom, top, near, far)?;
        Ok(Self { data })
    }

    pub fn frustum(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, MatrixError> {
        let mut data = [0.0; MATRIX_LEN];
        matrix::frustum(&mut data, left, right, bottom, top, near, far)?;
        Ok(Self { data })
    }

    /// Symmetric perspective projection; `fov_y` is in degrees.
    pub fn perspective(fov_y: f64, aspect: f64, z_near: f64, z_far: f64) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::perspective(&mut data, fov_y, aspect, z_near, z_far);
        Self { data }
    }

    pub fn to_array(self) -> [f64; MATRIX_LEN] {
        self.data
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Entry at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * 4 + row]
    }

    /// Translation column as `(x, y, z)`.
    pub fn translation(&self) -> [f64; 3] {
        [self.data[12], self.data[13], self.data[14]]
    }

    /// `self x rhs`.
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::mul_mm(&mut data, &self.data, &rhs.data);
        Self { data }
    }

    pub fn transform(&self, v: &Vector4) -> Vector4 {
        Vector4 {
            data: matrix::mul_mv(&self.data, &v.data),
        }
    }

    pub fn transpose(&self) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::transpose(&mut data, &self.data);
        Self { data }
    }

    /// The inverse, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Self> {
        matrix::invert(&self.data).map(|data| Self { data })
    }

    pub fn scaled(&self, x: f64, y: f64, z: f64) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::scale(&mut data, &self.data, x, y, z);
        Self { data }
    }

    pub fn scale(&mut self, x: f64, y: f64, z: f64) {
        matrix::scale_in_place(&mut self.data, x, y, z);
    }

    /// Translation in this matrix's local axes.
    pub fn translated(&self, x: f64, y: f64, z: f64) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        matrix::translate(&mut data, &self.data, x, y, z);
        Self { data }
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        matrix::translate_in_place(&mut self.data, x, y, z);
    }

    /// `self x R(degrees, axis)`.
    pub fn rotated(&self, degrees: f64, x: f64, y: f64, z: f64) -> Self {
        self.multiply(&Self::rotation(degrees, x, y, z))
    }

    pub fn rotate(&mut self, degrees: f64, x: f64, y: f64, z: f64) {
        *self = self.rotated(degrees, x, y, z);
    }

    /// Upper-left 3x3 block, column-major.
    pub fn upper_left_3x3(&self) -> [f64; 9] {
        let d = &self.data;
        [d[0], d[1], d[2], d[4], d[5], d[6], d[8], d[9], d[10]]
    }

    /// Narrowed copy for GPU upload.
    pub fn to_f32_array(&self) -> [f32; MATRIX_LEN] {
        self.data.map(|v| v as f32)
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; MATRIX_LEN]> for Matrix4 {
    fn from(data: [f64; MATRIX_LEN]) -> Self {
        Self { data }
    }
}

impl From<nalgebra::Matrix4<f64>> for Matrix4 {
    fn from(m: nalgebra::Matrix4<f64>) -> Self {
        let mut data = [0.0; MATRIX_LEN];
        data.copy_from_slice(m.as_slice());
        Self { data }
    }
}

impl From<Matrix4> for nalgebra::Matrix4<f64> {
    fn from(m: Matrix4) -> Self {
        nalgebra::Matrix4::from_column_slice(&m.data)
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        self.multiply(&rhs)
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;

    fn mul(self, rhs: Vector4) -> Vector4 {
        self.transform(&rhs)
    }
}

/// Homogeneous point or direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector4 {
    data: [f64; VECTOR_LEN],
}

impl Vector4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// A position (`w = 1`).
    pub const fn point(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 1.0)
    }

    /// A direction (`w = 0`); unaffected by translation.
    pub const fn direction(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 0.0)
    }

    pub fn x(&self) -> f64 {
        self.data[0]
    }

    pub fn y(&self) -> f64 {
        self.data[1]
    }

    pub fn z(&self) -> f64 {
        self.data[2]
    }

    pub fn w(&self) -> f64 {
        self.data[3]
    }

    pub fn to_array(self) -> [f64; VECTOR_LEN] {
        self.data
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Divides through by `w`; `None` when `w` is zero.
    pub fn perspective_divide(&self) -> Option<[f64; 3]> {
        let w = self.w();
        if w == 0.0 {
            return None;
        }
        Some([self.x() / w, self.y() / w, self.z() / w])
    }
}

impl From<[f64; VECTOR_LEN]> for Vector4 {
    fn from(data: [f64; VECTOR_LEN]) -> Self {
        Self { data }
    }
}
