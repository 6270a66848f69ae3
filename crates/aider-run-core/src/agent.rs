//! The seam between aider-run and the coding agent it delegates to.
//!
//! A backend turns a model name into a [`Model`], then a [`CoderSpec`] into a
//! [`Coder`]. The coder has a single operation: run one prompt to completion.

use crate::environment::AgentEnvironment;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by an agent backend while constructing or running a coder.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid model name {0:?}")]
    InvalidModel(String),

    /// The agent cannot be used on this system (e.g. not installed).
    #[error("{0}")]
    Unavailable(String),

    #[error("failed to start {program}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The agent ran but reported failure.
    #[error("{0}")]
    Failed(String),
}

/// Handle to a language model backend, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: String,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Everything a backend needs to build an editing session.
#[derive(Debug, Clone)]
pub struct CoderSpec {
    pub model: Model,
    pub editable_files: Vec<PathBuf>,
    pub read_only_files: Vec<PathBuf>,
    pub auto_commits: bool,
    /// Directory the agent runs in.
    pub working_dir: PathBuf,
    pub environment: AgentEnvironment,
}

/// An editing session bound to a model and a file scope.
#[async_trait]
pub trait Coder: Send {
    /// Runs the prompt to completion. The agent writes its own output.
    async fn run(&mut self, prompt: &str) -> Result<(), AgentError>;
}

/// Factory for models and coders.
pub trait AgentBackend {
    type Coder: Coder;

    /// Resolves a model handle. `environment` holds the overrides the agent
    /// will see, already final at this point.
    fn create_model(&self, name: &str, environment: &AgentEnvironment)
    -> Result<Model, AgentError>;

    fn create_coder(&self, spec: CoderSpec) -> Result<Self::Coder, AgentError>;
}
