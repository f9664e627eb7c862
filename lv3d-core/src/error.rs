/// Error types shared by the core crate
use thiserror::Error;

/// Invalid-argument failures raised by the matrix functions.
///
/// These are programmer errors: they are reported before anything is written
/// to the destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// A buffer cannot hold a full block at the requested offset.
    #[error("{name}: buffer of length {len} cannot hold {required} values at offset {offset}")]
    BufferTooShort {
        name: &'static str,
        offset: usize,
        len: usize,
        required: usize,
    },

    /// Projection planes that would divide by zero or flip the depth range.
    #[error("degenerate projection: {0}")]
    DegenerateProjection(&'static str),
}

/// Failures while loading a triangle mesh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),

    #[error("binary STL declares {declared} triangles but only {available} are present")]
    Truncated { declared: usize, available: usize },

    #[error("failed to parse ASCII STL near: {0:?}")]
    MalformedAscii(String),
}

/// Failures while reading slicer G-code into a toolpath.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolpathError {
    #[error("line {line}: malformed G-code {text:?}")]
    Malformed { line: usize, text: String },
}
