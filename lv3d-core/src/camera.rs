/// Camera and projection utilities
use nalgebra::{Point3, Vector3};

use crate::error::MatrixError;
use crate::geometry::Aabb;
use crate::mat4::{Matrix4, Vector4};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Orthographic => Self::Perspective,
            Self::Perspective => Self::Orthographic,
        }
    }
}

/// Closest the orbit may bring the view direction to the up vector (cosine).
const MAX_PITCH_COS: f64 = 0.999;

/// Orbiting look-at camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Point3<f64>,
    pub center: Point3<f64>,
    pub up: Vector3<f64>,
    /// Vertical field of view in degrees.
    pub fov_y: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 5.0),
            center: Point3::origin(),
            up: Vector3::y(),
            fov_y: 45.0,
            aspect: aspect_ratio(width, height),
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Distance from the eye to the point being looked at.
    pub fn distance(&self) -> f64 {
        (self.eye - self.center).norm()
    }

    /// World-to-eye transform.
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::look_at(
            to_array(&self.eye.coords),
            to_array(&self.center.coords),
            to_array(&self.up),
        )
    }

    /// Eye-to-clip transform for the current mode.
    ///
    /// The orthographic box matches the perspective frustum's extent at the
    /// center distance, so toggling modes keeps the model the same size.
    pub fn projection_matrix(&self) -> Result<Matrix4, MatrixError> {
        match self.mode {
            ProjectionMode::Perspective => {
                Ok(Matrix4::perspective(self.fov_y, self.aspect, self.near, self.far))
            }
            ProjectionMode::Orthographic => {
                let half_height = self.distance() * (self.fov_y.to_radians() / 2.0).tan();
                let half_width = half_height * self.aspect;
                Matrix4::ortho(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Result<Matrix4, MatrixError> {
        Ok(self.projection_matrix()? * self.view_matrix())
    }

    /// Swings the eye around `center`: `yaw` about the up vector, then `pitch`
    /// about the camera's right axis. A pitch that would align the view with
    /// the up vector is dropped.
    pub fn orbit(&mut self, yaw: f64, pitch: f64) {
        let up = self.up;
        let offset = self.eye - self.center;

        let yawed = rotate_direction(&offset, yaw, &up);

        let right = yawed.cross(&up);
        let pitched = if right.norm() > 0.0 && pitch != 0.0 {
            rotate_direction(&yawed, pitch, &right)
        } else {
            yawed
        };

        let alignment = pitched.normalize().dot(&up.normalize()).abs();
        let offset = if alignment < MAX_PITCH_COS { pitched } else { yawed };
        self.eye = self.center + offset;
    }

    /// Scales the eye distance by `factor`, never moving closer than `near`.
    /// The far plane travels with the eye.
    pub fn zoom(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let offset = self.eye - self.center;
        let distance = offset.norm();
        if distance == 0.0 {
            return;
        }
        let target = (distance * factor).max(self.near * 2.0);
        self.far += target - distance;
        self.eye = self.center + offset * (target / distance);
    }

    /// Points the camera at the box center and backs off until the bounding
    /// sphere fits the vertical field of view. Keeps the current view direction.
    pub fn frame(&mut self, bounds: &Aabb) {
        let center = bounds.center();
        let center = Point3::new(center.x as f64, center.y as f64, center.z as f64);
        let radius = (bounds.radius() as f64).max(1e-3);

        let direction = {
            let d = self.eye - self.center;
            if d.norm() > 0.0 {
                d.normalize()
            } else {
                Vector3::z()
            }
        };

        let distance = radius / (self.fov_y.to_radians() / 2.0).sin();
        self.center = center;
        self.eye = center + direction * distance;
        self.near = distance / 100.0;
        self.far = distance + radius * 4.0;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Projects a model-space point through `mvp` into screen pixels.
///
/// Returns `(x, y, depth)` with `depth` the normalized device z, or `None` for
/// points behind the eye or outside the clip square.
pub fn project_to_screen(
    mvp: &Matrix4,
    point: [f64; 3],
    width: u32,
    height: u32,
) -> Option<(f64, f64, f64)> {
    let clip = *mvp * Vector4::point(point[0], point[1], point[2]);

    // Behind (or on) the eye plane
    if clip.w() <= 1e-9 {
        return None;
    }
    let [ndc_x, ndc_y, ndc_z] = clip.perspective_divide()?;

    if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) {
        return None;
    }

    let screen_x = (ndc_x + 1.0) * 0.5 * width as f64;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f64;
    Some((screen_x, screen_y, ndc_z))
}

fn aspect_ratio(width: u32, height: u32) -> f64 {
    width.max(1) as f64 / height.max(1) as f64
}

fn to_array(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn rotate_direction(v: &Vector3<f64>, degrees: f64, axis: &Vector3<f64>) -> Vector3<f64> {
    let r = Matrix4::rotation(degrees, axis.x, axis.y, axis.z);
    let out = r * Vector4::direction(v.x, v.y, v.z);
    Vector3::new(out.x(), out.y(), out.z())
}
