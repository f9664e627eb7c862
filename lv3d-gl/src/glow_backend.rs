/// `ShaderBackend` over an OpenGL / OpenGL ES context
use glow::HasContext;

use crate::backend::{Primitive, ShaderBackend, ShaderStage, UniformData};

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn primitive_enum(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::LineStrip => glow::LINE_STRIP,
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

// SAFETY (all methods): the context is current on the calling thread, and
// every object handle passed in was created by this same context.
impl ShaderBackend for glow::Context {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;

    fn new_shader(&self, stage: ShaderStage) -> Result<glow::NativeShader, String> {
        unsafe { self.create_shader(stage_enum(stage)) }
    }

    fn compile(&self, shader: glow::NativeShader, source: &str) -> Result<(), String> {
        unsafe {
            self.shader_source(shader, source);
            self.compile_shader(shader);
            if self.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.get_shader_info_log(shader))
            }
        }
    }

    fn free_shader(&self, shader: glow::NativeShader) {
        unsafe { self.delete_shader(shader) }
    }

    fn new_program(&self) -> Result<glow::NativeProgram, String> {
        unsafe { self.create_program() }
    }

    fn link(
        &self,
        program: glow::NativeProgram,
        shaders: &[glow::NativeShader],
    ) -> Result<(), String> {
        unsafe {
            for &shader in shaders {
                self.attach_shader(program, shader);
            }
            self.link_program(program);
            for &shader in shaders {
                self.detach_shader(program, shader);
            }
            if self.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.get_program_info_log(program))
            }
        }
    }

    fn free_program(&self, program: glow::NativeProgram) {
        unsafe { self.delete_program(program) }
    }

    fn bind_program(&self, program: Option<glow::NativeProgram>) {
        unsafe { self.use_program(program) }
    }

    fn attribute_location(&self, program: glow::NativeProgram, name: &str) -> Option<u32> {
        unsafe { self.get_attrib_location(program, name) }
    }

    fn uniform_location(&self, program: glow::NativeProgram, name: &str) -> Option<u32> {
        unsafe { self.get_uniform_location(program, name) }.map(|location| location.0)
    }

    fn write_uniform(&self, location: u32, data: &UniformData) {
        let location = glow::NativeUniformLocation(location);
        let location = Some(&location);
        unsafe {
            match *data {
                UniformData::Int1(x) => self.uniform_1_i32(location, x),
                UniformData::Int2([x, y]) => self.uniform_2_i32(location, x, y),
                UniformData::Int3([x, y, z]) => self.uniform_3_i32(location, x, y, z),
                UniformData::Int4([x, y, z, w]) => self.uniform_4_i32(location, x, y, z, w),
                UniformData::Float1(x) => self.uniform_1_f32(location, x),
                UniformData::Float2([x, y]) => self.uniform_2_f32(location, x, y),
                UniformData::Float3([x, y, z]) => self.uniform_3_f32(location, x, y, z),
                UniformData::Float4([x, y, z, w]) => self.uniform_4_f32(location, x, y, z, w),
                UniformData::Mat3(ref m) => self.uniform_matrix_3_f32_slice(location, false, m),
                UniformData::Mat4(ref m) => self.uniform_matrix_4_f32_slice(location, false, m),
            }
        }
    }

    fn draw(&self, primitive: Primitive, first: i32, count: i32) {
        unsafe { self.draw_arrays(primitive_enum(primitive), first, count) }
    }
}
