//! # aider-run-core
//!
//! Core functionality for aider-run.
//!
//! This crate provides:
//! - Decoding of the JSON run request
//! - Preflight validation of the working directory and file scope
//! - The environment overrides handed to the coding agent
//! - The agent seam (`AgentBackend`, `Coder`) and the `Entrypoint` pipeline
//!   that validates a request and delegates it

mod agent;
mod entrypoint;
mod environment;
mod preflight;
mod request;

pub use agent::{AgentBackend, AgentError, Coder, CoderSpec, Model};
pub use entrypoint::{Entrypoint, EntrypointError, Host, summarize_prompt};
pub use environment::{AgentEnvironment, OPENAI_API_BASE, OPENAI_API_KEY};
pub use preflight::{PreflightError, RepoCheck, check_repo_path, missing_files};
pub use request::{DEFAULT_MODEL, RequestError, RunRequest};
