/// Per-frame preview pass: matrices in, draw calls out
use std::sync::Arc;

use lv3d_core::{Camera, Matrix4, MatrixError};

use crate::backend::{Primitive, ShaderBackend};
use crate::error::ShaderError;
use crate::program::ShaderProgram;
use crate::uniform::{ColorRgba, Location};

pub const MESH_VERTEX_SHADER: &str = include_str!("../shaders/mesh.vert");
pub const MESH_FRAGMENT_SHADER: &str = include_str!("../shaders/mesh.frag");
pub const TOOLPATH_VERTEX_SHADER: &str = include_str!("../shaders/toolpath.vert");
pub const TOOLPATH_FRAGMENT_SHADER: &str = include_str!("../shaders/toolpath.frag");

pub const VIEW_MODEL_MATRIX: &str = "view_model_matrix";
pub const PROJECTION_MATRIX: &str = "projection_matrix";
pub const VIEW_NORMAL_MATRIX: &str = "view_normal_matrix";
pub const UNIFORM_COLOR: &str = "uniform_color";

pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const NORMAL_ATTRIBUTE: &str = "a_normal";

/// Matrices uploaded once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub view_model: Matrix4,
    pub projection: Matrix4,
    /// Column-major 3x3 that carries normals into eye space.
    pub normal: [f64; 9],
}

impl FrameMatrices {
    /// The normal matrix is the inverse-transpose of the view-model rotation
    /// part; a singular view-model (a zero scale) falls back to the plain 3x3.
    pub fn new(camera: &Camera, model: &Matrix4) -> Result<Self, MatrixError> {
        let view_model = camera.view_matrix() * *model;
        let projection = camera.projection_matrix()?;
        let normal = view_model
            .inverse()
            .map(|inverse| inverse.transpose().upper_left_3x3())
            .unwrap_or_else(|| view_model.upper_left_3x3());

        Ok(Self {
            view_model,
            projection,
            normal,
        })
    }
}

/// The two programs the preview draws with.
#[derive(Debug)]
pub struct PreviewPrograms<B: ShaderBackend> {
    mesh: ShaderProgram<B>,
    toolpath: ShaderProgram<B>,
}

impl<B: ShaderBackend> PreviewPrograms<B> {
    pub fn compile(backend: &Arc<B>) -> Result<Self, ShaderError> {
        let mesh = ShaderProgram::compile(
            backend.clone(),
            "mesh",
            MESH_VERTEX_SHADER,
            MESH_FRAGMENT_SHADER,
        )?;
        let toolpath = ShaderProgram::compile(
            backend.clone(),
            "toolpath",
            TOOLPATH_VERTEX_SHADER,
            TOOLPATH_FRAGMENT_SHADER,
        )?;
        Ok(Self { mesh, toolpath })
    }

    pub fn mesh(&self) -> &ShaderProgram<B> {
        &self.mesh
    }

    pub fn toolpath(&self) -> &ShaderProgram<B> {
        &self.toolpath
    }

    /// Locations for binding mesh vertex buffers: `(position, normal)`.
    pub fn mesh_attributes(&self) -> (Location, Location) {
        (
            self.mesh.attribute_location(POSITION_ATTRIBUTE),
            self.mesh.attribute_location(NORMAL_ATTRIBUTE),
        )
    }

    pub fn toolpath_position_attribute(&self) -> Location {
        self.toolpath.attribute_location(POSITION_ATTRIBUTE)
    }

    /// Draws `vertex_count` triangle vertices from the bound mesh buffers.
    pub fn draw_mesh(&self, frame: &FrameMatrices, color: ColorRgba, vertex_count: i32) {
        let program = self.mesh.bind();
        program.set_uniform(VIEW_MODEL_MATRIX, &frame.view_model);
        program.set_uniform(PROJECTION_MATRIX, &frame.projection);
        program.set_uniform(VIEW_NORMAL_MATRIX, frame.normal);
        program.set_uniform(UNIFORM_COLOR, color);
        program.draw(Primitive::Triangles, 0, vertex_count);
    }

    /// Draws line-segment vertices `first..first + count` from the bound toolpath buffer.
    pub fn draw_toolpath(&self, frame: &FrameMatrices, color: ColorRgba, first: i32, count: i32) {
        let program = self.toolpath.bind();
        program.set_uniform(VIEW_MODEL_MATRIX, &frame.view_model);
        program.set_uniform(PROJECTION_MATRIX, &frame.projection);
        // Not declared by the toolpath shader; skipped like any missing uniform
        program.set_uniform(VIEW_NORMAL_MATRIX, frame.normal);
        program.set_uniform(UNIFORM_COLOR, color);
        program.draw(Primitive::Lines, first, count);
    }
}
