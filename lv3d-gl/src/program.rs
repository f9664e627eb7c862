/// Compiled GPU program with cached name lookups
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::backend::{Primitive, ShaderBackend, ShaderStage};
use crate::error::ShaderError;
use crate::uniform::{Location, UniformTarget, UniformValue};

/// Owns one linked vertex + fragment program.
///
/// Attribute and uniform locations are looked up by name on first use and
/// cached for the life of the program. Dropping the value deletes the GPU
/// program, so it must be dropped on the rendering thread.
pub struct ShaderProgram<B: ShaderBackend> {
    backend: Arc<B>,
    program: B::Program,
    name: String,
    attributes: RefCell<HashMap<String, Location>>,
    uniforms: RefCell<HashMap<String, Location>>,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    /// Compiles both stages and links them.
    ///
    /// On failure every GPU object created along the way is released and the
    /// error is logged once; no program value exists to activate.
    pub fn compile(
        backend: Arc<B>,
        name: impl Into<String>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let name = name.into();
        let gpu = backend.as_ref();

        let vertex = compile_stage(gpu, &name, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile_stage(gpu, &name, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(e) => {
                gpu.free_shader(vertex);
                return Err(e);
            }
        };

        let program = match gpu.new_program() {
            Ok(program) => program,
            Err(reason) => {
                gpu.free_shader(vertex);
                gpu.free_shader(fragment);
                return Err(report(ShaderError::CreateProgram {
                    program: name,
                    reason,
                }));
            }
        };

        let linked = gpu.link(program, &[vertex, fragment]);
        gpu.free_shader(vertex);
        gpu.free_shader(fragment);
        if let Err(log) = linked {
            gpu.free_program(program);
            return Err(report(ShaderError::Link { program: name, log }));
        }

        info!(program = %name, "linked shader program");
        Ok(Self {
            backend,
            program,
            name,
            attributes: RefCell::new(HashMap::new()),
            uniforms: RefCell::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Makes this the current program; pair with [`ShaderProgram::deactivate`].
    pub fn activate(&self) {
        self.backend.bind_program(Some(self.program));
    }

    pub fn deactivate(&self) {
        self.backend.bind_program(None);
    }

    /// Activates the program until the returned guard is dropped.
    pub fn bind(&self) -> ActiveProgram<'_, B> {
        self.activate();
        ActiveProgram { program: self }
    }

    pub fn attribute_location(&self, name: &str) -> Location {
        self.cached_location(&self.attributes, "attribute", name, |gpu, program, name| {
            gpu.attribute_location(program, name)
        })
    }

    pub fn uniform_location(&self, name: &str) -> Location {
        self.cached_location(&self.uniforms, "uniform", name, |gpu, program, name| {
            gpu.uniform_location(program, name)
        })
    }

    /// Writes a uniform of this program, which should be the active one.
    ///
    /// A name or location the program does not have is ignored.
    pub fn set_uniform<'a>(
        &self,
        target: impl Into<UniformTarget<'a>>,
        value: impl Into<UniformValue<'a>>,
    ) {
        let location = match target.into() {
            UniformTarget::Name(name) => self.uniform_location(name),
            UniformTarget::Location(location) => location,
        };
        let Some(index) = location.index() else {
            return;
        };

        let value = value.into();
        match value.to_data() {
            Some(data) => self.backend.write_uniform(index, &data),
            None => warn!(
                program = %self.name,
                location = location.0,
                ?value,
                "unsupported uniform payload skipped"
            ),
        }
    }

    /// Draws `count` vertices from the externally bound vertex data.
    pub fn draw(&self, primitive: Primitive, first: i32, count: i32) {
        self.backend.draw(primitive, first, count);
    }

    fn cached_location(
        &self,
        cache: &RefCell<HashMap<String, Location>>,
        kind: &'static str,
        name: &str,
        query: impl FnOnce(&B, B::Program, &str) -> Option<u32>,
    ) -> Location {
        if let Some(&location) = cache.borrow().get(name) {
            return location;
        }

        let location = query(self.backend.as_ref(), self.program, name)
            .map_or(Location::NOT_FOUND, Location::from_index);
        if location.is_found() {
            debug!(program = %self.name, kind, name, location = location.0, "resolved location");
        } else {
            debug!(program = %self.name, kind, name, "name not present in program");
        }
        cache.borrow_mut().insert(name.to_owned(), location);
        location
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.backend.free_program(self.program);
    }
}

impl<B: ShaderBackend> std::fmt::Debug for ShaderProgram<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

/// Guard returned by [`ShaderProgram::bind`]; deactivates on drop.
pub struct ActiveProgram<'p, B: ShaderBackend> {
    program: &'p ShaderProgram<B>,
}

impl<B: ShaderBackend> std::ops::Deref for ActiveProgram<'_, B> {
    type Target = ShaderProgram<B>;

    fn deref(&self) -> &Self::Target {
        self.program
    }
}

impl<B: ShaderBackend> Drop for ActiveProgram<'_, B> {
    fn drop(&mut self) {
        self.program.deactivate();
    }
}

fn compile_stage<B: ShaderBackend>(
    gpu: &B,
    program: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Shader, ShaderError> {
    let shader = gpu.new_shader(stage).map_err(|reason| {
        report(ShaderError::CreateShader {
            program: program.to_owned(),
            stage,
            reason,
        })
    })?;

    if let Err(log) = gpu.compile(shader, source) {
        gpu.free_shader(shader);
        return Err(report(ShaderError::Compile {
            program: program.to_owned(),
            stage,
            log,
        }));
    }
    Ok(shader)
}

fn report(err: ShaderError) -> ShaderError {
    error!(%err, "shader program build failed");
    err
}
