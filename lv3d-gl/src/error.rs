/// Shader build failures
use thiserror::Error;

use crate::backend::ShaderStage;

/// Why a [`ShaderProgram`](crate::ShaderProgram) could not be built.
///
/// Every variant carries the program name; compile and link failures carry the
/// driver's diagnostic text unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("{program}: could not create {stage} shader: {reason}")]
    CreateShader {
        program: String,
        stage: ShaderStage,
        reason: String,
    },

    #[error("{program}: {stage} shader failed to compile:\n{log}")]
    Compile {
        program: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("{program}: could not create program object: {reason}")]
    CreateProgram { program: String, reason: String },

    #[error("{program}: link failed:\n{log}")]
    Link { program: String, log: String },
}

impl ShaderError {
    /// Stage whose compilation failed, if the failure is stage specific.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            Self::CreateShader { stage, .. } | Self::Compile { stage, .. } => Some(*stage),
            Self::CreateProgram { .. } | Self::Link { .. } => None,
        }
    }
}
