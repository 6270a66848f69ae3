//! The JSON run request accepted on the command line.

use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Errors produced while decoding a run request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The input is not valid JSON or does not have the expected shape.
    #[error("Invalid JSON input")]
    InvalidJson(#[from] serde_json::Error),

    /// A required field is absent or falsy.
    #[error("'{0}' is required in the JSON input.")]
    MissingField(&'static str),

    /// A field is present but has an unusable type.
    #[error("'{field}' {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Wire shape of the request. Every field is optional here so that `null`
/// and absent keys behave the same; defaults are applied in `RunRequest`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    prompt: Option<Value>,
    #[serde(default)]
    editable_files: Option<Vec<PathBuf>>,
    #[serde(default)]
    read_only_files: Option<Vec<PathBuf>>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    repo_path: Option<PathBuf>,
    #[serde(default)]
    auto_commits: Option<bool>,
    #[serde(default)]
    verbose: Option<bool>,
}

/// A validated run request.
///
/// Lives for a single invocation: decoded once in `main` and consumed by the
/// `Entrypoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Instruction forwarded to the coding agent. Never empty.
    pub prompt: String,
    /// Paths the agent may modify, in request order.
    pub editable_files: Vec<PathBuf>,
    /// Paths the agent may read but not modify, in request order.
    pub read_only_files: Vec<PathBuf>,
    pub model_name: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    /// Working directory for the agent. Validated by preflight when set.
    pub repo_path: Option<PathBuf>,
    pub auto_commits: bool,
    /// Accepted for compatibility; only affects local log verbosity.
    pub verbose: bool,
}

impl RunRequest {
    /// Decodes a request from its JSON text.
    pub fn from_json(input: &str) -> Result<Self, RequestError> {
        let raw: RawRequest = serde_json::from_str(input)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRequest) -> Result<Self, RequestError> {
        let prompt = prompt_from_value(raw.prompt)?;

        Ok(Self {
            prompt,
            editable_files: raw.editable_files.unwrap_or_default(),
            read_only_files: raw.read_only_files.unwrap_or_default(),
            model_name: raw
                .model_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: non_empty(raw.api_key),
            api_base: non_empty(raw.api_base),
            repo_path: raw.repo_path.filter(|p| !p.as_os_str().is_empty()),
            auto_commits: raw.auto_commits.unwrap_or(false),
            verbose: raw.verbose.unwrap_or(false),
        })
    }

    /// Model name as it should be handed to the agent.
    ///
    /// A custom `apiBase` is an OpenAI-compatible endpoint, so the model is
    /// routed through the `openai/` provider.
    pub fn resolved_model_name(&self) -> String {
        if self.api_base.is_some() {
            format!("openai/{}", self.model_name)
        } else {
            self.model_name.clone()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Applies truthiness rules to the `prompt` field: absent, `null`, `false`,
/// zero and empty values all count as missing.
fn prompt_from_value(value: Option<Value>) -> Result<String, RequestError> {
    match value {
        Some(Value::String(text)) if !text.is_empty() => Ok(text),
        None | Some(Value::Null | Value::Bool(false)) => Err(RequestError::MissingField("prompt")),
        Some(Value::String(_)) => Err(RequestError::MissingField("prompt")),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
            Err(RequestError::MissingField("prompt"))
        }
        Some(Value::Array(items)) if items.is_empty() => Err(RequestError::MissingField("prompt")),
        Some(Value::Object(map)) if map.is_empty() => Err(RequestError::MissingField("prompt")),
        Some(other) => Err(RequestError::InvalidField {
            field: "prompt",
            reason: format!("must be a string, found {}", value_kind(&other)),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
