/// The GPU seam used by shader programs
use std::fmt;

/// Pipeline stage of a shader object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// How `draw` assembles the bound vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// A uniform payload in the form the GPU accepts: 32-bit ints and floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Int1(i32),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    Float1(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    /// Column-major
    Mat3([f32; 9]),
    /// Column-major
    Mat4([f32; 16]),
}

/// Minimal set of GPU operations a [`ShaderProgram`](crate::ShaderProgram) needs.
///
/// Every call must happen on the thread that owns the current rendering
/// context. Failures that the driver reports as text (`compile`, `link`,
/// object creation) return that text as the error.
pub trait ShaderBackend {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;

    fn new_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;

    /// Uploads `source` and compiles it; `Err` holds the info log.
    fn compile(&self, shader: Self::Shader, source: &str) -> Result<(), String>;

    fn free_shader(&self, shader: Self::Shader);

    fn new_program(&self) -> Result<Self::Program, String>;

    /// Links the given compiled shaders into `program`, detaching them
    /// afterwards; `Err` holds the info log.
    fn link(&self, program: Self::Program, shaders: &[Self::Shader]) -> Result<(), String>;

    fn free_program(&self, program: Self::Program);

    /// Makes `program` current, or clears the current program with `None`.
    fn bind_program(&self, program: Option<Self::Program>);

    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    /// Writes a uniform of the currently bound program.
    fn write_uniform(&self, location: u32, data: &UniformData);

    fn draw(&self, primitive: Primitive, first: i32, count: i32);
}
