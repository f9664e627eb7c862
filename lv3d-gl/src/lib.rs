/// LV3D GL - Shader programs and the GPU preview pass
///
/// Compiles vertex/fragment program pairs, caches their attribute and uniform
/// locations, and uploads typed uniform values (including the `f64` matrices
/// from `lv3d-core`, narrowed for the GPU). The GPU is reached through the
/// [`ShaderBackend`] trait, implemented for `glow::Context`.
///
/// Everything here must run on the thread that owns the rendering context.

pub mod backend;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
mod glow_backend;
pub mod preview;
pub mod program;
pub mod uniform;

#[cfg(test)]
mod mock;

pub use backend::{Primitive, ShaderBackend, ShaderStage, UniformData};
pub use error::ShaderError;
pub use preview::{FrameMatrices, PreviewPrograms};
pub use program::{ActiveProgram, ShaderProgram};
pub use uniform::{ColorRgb, ColorRgba, Location, UniformTarget, UniformValue};
