/// In-memory backend that records GPU calls for tests
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::backend::{Primitive, ShaderBackend, ShaderStage, UniformData};

/// A source containing this line fails to compile.
pub const COMPILE_ERROR: &str = "#error deliberate";
/// A source containing this line compiles but fails to link.
pub const LINK_ERROR: &str = "// link: unresolved";

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, (ShaderStage, String)>,
    programs: HashMap<u32, Linked>,
    current: Option<u32>,
    writes: Vec<(u32, UniformData)>,
    draws: Vec<(Primitive, i32, i32)>,
    uniform_queries: usize,
    attribute_queries: usize,
}

/// Declarations found when linking: names in declaration order.
#[derive(Default)]
struct Linked {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
pub struct RecordingBackend {
    state: RefCell<State>,
    fail_program_creation: bool,
}

impl RecordingBackend {
    pub fn failing_program_creation() -> Self {
        Self {
            fail_program_creation: true,
            ..Self::default()
        }
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn current(&self) -> Option<u32> {
        self.state.borrow().current
    }

    pub fn writes(&self) -> Vec<(u32, UniformData)> {
        self.state.borrow().writes.clone()
    }

    pub fn draws(&self) -> Vec<(Primitive, i32, i32)> {
        self.state.borrow().draws.clone()
    }

    pub fn uniform_queries(&self) -> usize {
        self.state.borrow().uniform_queries
    }

    pub fn attribute_queries(&self) -> usize {
        self.state.borrow().attribute_queries
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }
}

/// `uniform vec4 tint;` -> `tint`
fn declared_name<'s>(line: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = line.trim().strip_prefix(keyword)?.strip_prefix(' ')?;
    let mut tokens = rest.split_whitespace();
    let _ty = tokens.next()?;
    Some(tokens.next()?.trim_end_matches(';'))
}

impl ShaderBackend for RecordingBackend {
    type Shader = u32;
    type Program = u32;

    fn new_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let id = self.next_id();
        self.state
            .borrow_mut()
            .shaders
            .insert(id, (stage, String::new()));
        Ok(id)
    }

    fn compile(&self, shader: u32, source: &str) -> Result<(), String> {
        if source.contains(COMPILE_ERROR) {
            return Err("0:3(1): error: syntax error, unexpected '#'".to_string());
        }
        if let Some(entry) = self.state.borrow_mut().shaders.get_mut(&shader) {
            entry.1 = source.to_string();
        }
        Ok(())
    }

    fn free_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn new_program(&self) -> Result<u32, String> {
        if self.fail_program_creation {
            return Err("out of memory".to_string());
        }
        let id = self.next_id();
        self.state.borrow_mut().programs.insert(id, Linked::default());
        Ok(id)
    }

    fn link(&self, program: u32, shaders: &[u32]) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let mut linked = Linked::default();
        let mut seen = HashSet::new();
        for shader in shaders {
            let Some((stage, source)) = state.shaders.get(shader) else {
                return Err(format!("shader {shader} does not exist"));
            };
            if source.contains(LINK_ERROR) {
                return Err("error: unresolved reference".to_string());
            }
            for line in source.lines() {
                if let Some(name) = declared_name(line, "uniform") {
                    if seen.insert(name.to_string()) {
                        linked.uniforms.push(name.to_string());
                    }
                }
                if *stage == ShaderStage::Vertex {
                    if let Some(name) = declared_name(line, "in") {
                        linked.attributes.push(name.to_string());
                    }
                }
            }
        }
        state.programs.insert(program, linked);
        Ok(())
    }

    fn free_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn bind_program(&self, program: Option<u32>) {
        self.state.borrow_mut().current = program;
    }

    fn attribute_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.attribute_queries += 1;
        let linked = state.programs.get(&program)?;
        let index = linked.attributes.iter().position(|n| n == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.uniform_queries += 1;
        let linked = state.programs.get(&program)?;
        let index = linked.uniforms.iter().position(|n| n == name)?;
        u32::try_from(index).ok()
    }

    fn write_uniform(&self, location: u32, data: &UniformData) {
        self.state.borrow_mut().writes.push((location, *data));
    }

    fn draw(&self, primitive: Primitive, first: i32, count: i32) {
        self.state.borrow_mut().draws.push((primitive, first, count));
    }
}
