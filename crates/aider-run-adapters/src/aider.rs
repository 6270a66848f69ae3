//! Aider backend: builds an aider command line and runs it as a child process.

use crate::detect::{DEFAULT_BINARY, detect_agent};
use aider_run_core::{
    AgentBackend, AgentEnvironment, AgentError, Coder, CoderSpec, Model, OPENAI_API_BASE,
};
use async_trait::async_trait;
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

/// Flags passed on every run. The agent must never stop to ask a question:
/// stdin is closed and confirmations are auto-accepted.
const FIXED_ARGS: &[&str] = &[
    "--yes-always",
    "--no-suggest-shell-commands",
    "--no-check-update",
    "--no-show-model-warnings",
];

/// Backend that delegates to the `aider` CLI.
#[derive(Debug, Clone, Default)]
pub struct AiderBackend {
    binary: Option<PathBuf>,
    dry_run: bool,
}

impl AiderBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit executable (name or path) instead of `aider` on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Prints the command instead of running it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn resolve_program(&self) -> Result<PathBuf, AgentError> {
        match detect_agent(self.binary.as_deref()) {
            Ok(path) => Ok(path),
            Err(e) if self.dry_run => {
                warn!("{}", e);
                Ok(self
                    .binary
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)))
            }
            Err(e) => Err(AgentError::Unavailable(e.to_string())),
        }
    }
}

impl AgentBackend for AiderBackend {
    type Coder = AiderCoder;

    fn create_model(
        &self,
        name: &str,
        environment: &AgentEnvironment,
    ) -> Result<Model, AgentError> {
        let name = name.trim();
        if name.is_empty() || name.ends_with('/') {
            return Err(AgentError::InvalidModel(name.to_string()));
        }
        if let Some(api_base) = environment.get(OPENAI_API_BASE) {
            debug!("Model {} will be served by {}", name, api_base);
        }
        Ok(Model::new(name))
    }

    fn create_coder(&self, spec: CoderSpec) -> Result<AiderCoder, AgentError> {
        let program = self.resolve_program()?;

        if !spec.working_dir.is_dir() {
            return Err(AgentError::Unavailable(format!(
                "working directory {} is not a directory",
                spec.working_dir.display()
            )));
        }

        let args = build_args(&spec);
        debug!("Prepared aider arguments: {:?}", args);

        Ok(AiderCoder {
            program,
            args,
            working_dir: spec.working_dir,
            environment: spec.environment,
            dry_run: self.dry_run,
        })
    }
}

/// Builds every argument except the prompt.
///
/// Outside a git repository `--no-git` keeps aider from offering to create
/// one, which `--yes-always` would otherwise accept.
pub fn build_args(spec: &CoderSpec) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--model".into(), spec.model.name().into()];
    args.extend(FIXED_ARGS.iter().map(OsString::from));

    args.push(if spec.auto_commits {
        "--auto-commits".into()
    } else {
        "--no-auto-commits".into()
    });

    if !spec.working_dir.join(".git").exists() {
        args.push("--no-git".into());
    }

    for file in &spec.editable_files {
        args.push("--file".into());
        args.push(file.into());
    }
    for file in &spec.read_only_files {
        args.push("--read".into());
        args.push(file.into());
    }

    args
}

/// A prepared aider invocation. Each `run` spawns one aider process.
#[derive(Debug)]
pub struct AiderCoder {
    program: PathBuf,
    args: Vec<OsString>,
    working_dir: PathBuf,
    environment: AgentEnvironment,
    dry_run: bool,
}

impl AiderCoder {
    #[cfg(test)]
    fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Shell-style rendering of the full invocation, secrets masked.
    pub fn command_line(&self, prompt: &str) -> String {
        let mut parts: Vec<String> = self
            .environment
            .redacted()
            .map(|(name, value)| format!("{}={}", name, shell_quote(value)))
            .collect();
        parts.push(shell_quote(&self.program.to_string_lossy()).into_owned());
        parts.extend(
            self.args
                .iter()
                .map(|arg| shell_quote(&arg.to_string_lossy()).into_owned()),
        );
        parts.push("--message".to_string());
        parts.push(shell_quote(prompt).into_owned());
        parts.join(" ")
    }
}

#[async_trait]
impl Coder for AiderCoder {
    async fn run(&mut self, prompt: &str) -> Result<(), AgentError> {
        if self.dry_run {
            println!("{}", self.command_line(prompt));
            return Ok(());
        }

        let program = self.program.display().to_string();
        debug!("Spawning {} in {}", program, self.working_dir.display());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--message")
            .arg(prompt)
            .current_dir(&self.working_dir)
            .envs(self.environment.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AgentError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = child
            .wait()
            .await
            .map_err(|source| AgentError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(AgentError::Failed(format!(
                "{} {}",
                program,
                describe_status(status)
            )))
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn shell_quote(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if plain {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}
