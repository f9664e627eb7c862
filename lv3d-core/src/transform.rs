/// Model placement and the model-view-projection chain
use crate::mat4::Matrix4;

/// Rotation state around three axes (in degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in degrees), wrapping each axis into (-360, 360)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x = (self.x + dx) % 360.0;
        self.y = (self.y + dy) % 360.0;
        self.z = (self.z + dz) % 360.0;
    }
}

/// Where a model sits in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPlacement {
    pub position: [f64; 3],
    pub rotation: RotationState,
    pub scale: [f64; 3],
    /// Model-space point that rotation and scale happen about.
    pub pivot: [f64; 3],
}

impl ModelPlacement {
    /// Model-to-world matrix: translate, then rotate Z·Y·X, then scale, all
    /// about the pivot, which lands on `position`.
    pub fn model_matrix(&self) -> Matrix4 {
        let [px, py, pz] = self.position;
        let [sx, sy, sz] = self.scale;
        let [cx, cy, cz] = self.pivot;
        let mut m = Transform::translation_matrix(px, py, pz);
        m = m * Transform::rotation_matrix(&self.rotation);
        m.scale(sx, sy, sz);
        m.translate(-cx, -cy, -cz);
        m
    }

    /// Pivots the model about `center` and puts that point on the origin.
    pub fn centered_on(center: [f64; 3]) -> Self {
        Self {
            pivot: center,
            ..Self::default()
        }
    }
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: RotationState::zero(),
            scale: [1.0; 3],
            pivot: [0.0; 3],
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation matrix applying X first, then Y, then Z
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4 {
        let mut m = Matrix4::IDENTITY;
        m.rotate(rotation.z, 0.0, 0.0, 1.0);
        m.rotate(rotation.y, 0.0, 1.0, 0.0);
        m.rotate(rotation.x, 1.0, 0.0, 0.0);
        m
    }

    pub fn translation_matrix(x: f64, y: f64, z: f64) -> Matrix4 {
        let mut m = Matrix4::IDENTITY;
        m.translate(x, y, z);
        m
    }

    pub fn scale_matrix(sx: f64, sy: f64, sz: f64) -> Matrix4 {
        let mut m = Matrix4::IDENTITY;
        m.scale(sx, sy, sz);
        m
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(model: &Matrix4, view: &Matrix4, projection: &Matrix4) -> Matrix4 {
        *projection * *view * *model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat4::Vector4;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state, RotationState::new(0.0, 0.0, 0.0));

        state.rotate(10.0, 20.0, 30.0);
        assert_eq!(state, RotationState::new(10.0, 20.0, 30.0));

        state.rotate(355.0, -30.0, 0.0);
        assert_relative_eq!(state.x, 5.0);
        assert_relative_eq!(state.y, -10.0);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        assert_eq!(matrix, Matrix4::IDENTITY);
    }

    #[test]
    fn test_rotation_order_is_x_then_y_then_z() {
        let m = Transform::rotation_matrix(&RotationState::new(90.0, 90.0, 0.0));
        // X turns +Y into +Z, then Y turns +Z into +X.
        let v = m * Vector4::direction(0.0, 1.0, 0.0);
        assert_eq!(v.to_array(), [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_model_matrix_scales_before_translating() {
        let placement = ModelPlacement {
            position: [10.0, 0.0, 0.0],
            rotation: RotationState::zero(),
            scale: [2.0, 2.0, 2.0],
            pivot: [0.0; 3],
        };
        let p = placement.model_matrix() * Vector4::point(1.0, 1.0, 1.0);
        assert_eq!(p.to_array(), [12.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_centered_on() {
        let placement = ModelPlacement::centered_on([1.0, 2.0, 3.0]);
        let p = placement.model_matrix() * Vector4::point(1.0, 2.0, 3.0);
        assert_eq!(p.to_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rotation_turns_about_the_pivot() {
        let mut placement = ModelPlacement::centered_on([10.0, 0.0, 0.0]);
        placement.rotation = RotationState::new(0.0, 0.0, 90.0);
        // One unit right of the pivot ends up one unit above the origin.
        let p = placement.model_matrix() * Vector4::point(11.0, 0.0, 0.0);
        assert_eq!(p.to_array(), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_mvp_order() {
        let model = Transform::translation_matrix(1.0, 0.0, 0.0);
        let view = Transform::scale_matrix(2.0, 2.0, 2.0);
        let projection = Matrix4::IDENTITY;
        let mvp = Transform::mvp_matrix(&model, &view, &projection);
        let p = mvp * Vector4::point(0.0, 0.0, 0.0);
        assert_eq!(p.to_array(), [2.0, 0.0, 0.0, 1.0]);
    }
}
