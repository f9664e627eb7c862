/// LV3D Core Library - Transform math, camera and model data for the preview
///
/// This library provides the stateless core of the 3D preview: column-major
/// `f64` 4x4 transform math (buffer-level functions plus the `Matrix4` and
/// `Vector4` value types), camera and model placement, STL meshes and G-code
/// toolpaths. It performs no GPU calls and no file I/O.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod mat4;
pub mod matrix;
pub mod stl;
pub mod toolpath;
pub mod transform;

// Re-export commonly used types
pub use camera::{project_to_screen, Camera, ProjectionMode};
pub use error::{MatrixError, MeshError, ToolpathError};
pub use geometry::{Aabb, Mesh, Triangle, Vertex};
pub use mat4::{Matrix4, Vector4};
pub use matrix::Operand;
pub use toolpath::{parse_gcode, SegmentKind, Toolpath, ToolpathSegment};
pub use transform::{ModelPlacement, RotationState, Transform};
