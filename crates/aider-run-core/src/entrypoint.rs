//! The validate-then-delegate pipeline.
//!
//! Order matters: the request is decoded and every precondition is checked
//! before the agent environment is assembled, and the environment is final
//! before the backend is asked for a model.

use crate::agent::{AgentBackend, AgentError, Coder, CoderSpec};
use crate::environment::{AgentEnvironment, OPENAI_API_KEY};
use crate::preflight::{PreflightError, check_repo_path, missing_files};
use crate::request::{RequestError, RunRequest};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

const PROMPT_PREVIEW_CHARS: usize = 100;

/// Every way a run can fail. All of them are fatal for the process.
#[derive(Debug, Error)]
pub enum EntrypointError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Preflight(#[from] PreflightError),

    #[error(
        "When 'apiBase' is provided, you must also provide either the 'apiKey' option or set the 'OPENAI_API_KEY' environment variable."
    )]
    MissingApiKey,

    #[error("could not determine the current directory; set repoPath")]
    NoWorkingDir,

    #[error("failed to initialize aider")]
    Initialization(#[source] AgentError),

    #[error("aider execution failed")]
    Execution(#[source] AgentError),
}

/// Facts about the invoking process that the pipeline depends on.
#[derive(Debug, Clone)]
pub struct Host {
    /// Working directory used when the request has no `repoPath`. `None`
    /// when the process's current directory is unreadable (e.g. deleted).
    pub current_dir: Option<PathBuf>,
    /// Whether `OPENAI_API_KEY` is already set in this process's environment.
    pub inherited_api_key: bool,
}

impl Host {
    /// Reads the host facts from the running process.
    pub fn detect() -> Self {
        Self {
            current_dir: std::env::current_dir().ok(),
            inherited_api_key: std::env::var_os(OPENAI_API_KEY).is_some_and(|v| !v.is_empty()),
        }
    }
}

/// Runs one request against an agent backend.
pub struct Entrypoint<B> {
    backend: B,
    host: Host,
}

impl<B: AgentBackend> Entrypoint<B> {
    pub fn new(backend: B, host: Host) -> Self {
        Self { backend, host }
    }

    #[cfg(test)]
    fn backend(&self) -> &B {
        &self.backend
    }

    /// Decodes `input` and runs it.
    pub async fn run_json(&self, input: &str) -> Result<(), EntrypointError> {
        let request = RunRequest::from_json(input)?;
        self.run(request).await
    }

    /// Validates the request, prepares the agent environment, builds the
    /// coder and runs the prompt.
    pub async fn run(&self, request: RunRequest) -> Result<(), EntrypointError> {
        let working_dir = match &request.repo_path {
            Some(path) => {
                let check = check_repo_path(path)?;
                if !check.has_git {
                    warn!(
                        "repoPath {} is not a git repository (no .git found), continuing",
                        path.display()
                    );
                }
                check.path
            }
            None => self
                .host
                .current_dir
                .clone()
                .ok_or(EntrypointError::NoWorkingDir)?,
        };

        if request.api_base.is_some() && request.api_key.is_none() && !self.host.inherited_api_key
        {
            return Err(EntrypointError::MissingApiKey);
        }

        let environment = AgentEnvironment::from_request(&request);
        for (name, value) in environment.redacted() {
            debug!("Setting {}={} for the agent process", name, value);
        }

        let all_files = request
            .editable_files
            .iter()
            .chain(request.read_only_files.iter());
        for file in missing_files(&working_dir, all_files) {
            warn!("File not found: {}", file.display());
        }

        let model = self
            .backend
            .create_model(&request.resolved_model_name(), &environment)
            .map_err(EntrypointError::Initialization)?;
        let model_name = model.name().to_string();

        let spec = CoderSpec {
            model,
            editable_files: request.editable_files.clone(),
            read_only_files: request.read_only_files.clone(),
            auto_commits: request.auto_commits,
            working_dir,
            environment,
        };
        let mut coder = self
            .backend
            .create_coder(spec)
            .map_err(EntrypointError::Initialization)?;

        info!("Running aider with model: {}", model_name);
        info!("Editable files: {:?}", request.editable_files);
        info!("Read-only files: {:?}", request.read_only_files);
        info!("Prompt: {}", summarize_prompt(&request.prompt));

        coder
            .run(&request.prompt)
            .await
            .map_err(EntrypointError::Execution)?;

        info!("Aider execution finished.");
        Ok(())
    }
}

/// First 100 characters of the prompt, with `...` appended when cut.
pub fn summarize_prompt(prompt: &str) -> String {
    match prompt.char_indices().nth(PROMPT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &prompt[..cut]),
        None => prompt.to_string(),
    }
}
