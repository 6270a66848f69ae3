//! # aider-run-adapters
//!
//! Agent backend for aider-run.
//!
//! This crate implements the `AgentBackend` seam from `aider-run-core` on top
//! of the aider CLI: the executable is located on `PATH` (or given
//! explicitly), the request is rendered as aider flags, and the prompt is
//! run in a child process whose output goes straight to the terminal.

mod aider;
mod detect;

pub use aider::{AiderBackend, AiderCoder, build_args};
pub use detect::{DEFAULT_BINARY, NoAgentError, detect_agent};
