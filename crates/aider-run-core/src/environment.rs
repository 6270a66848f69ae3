//! Environment overrides for the delegated agent process.
//!
//! The overrides are applied to the agent's process only. This process never
//! mutates its own environment.

use crate::request::RunRequest;

/// Endpoint override read by the agent's OpenAI-compatible HTTP client.
pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";

/// Credential read by the agent's OpenAI-compatible HTTP client.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

const REDACTED: &str = "<redacted>";

/// Ordered set of `NAME=value` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentEnvironment {
    vars: Vec<(String, String)>,
}

impl AgentEnvironment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the overrides a request asks for. Credential format is not checked.
    pub fn from_request(request: &RunRequest) -> Self {
        let mut env = Self::new();
        if let Some(api_base) = &request.api_base {
            env.set(OPENAI_API_BASE, api_base);
        }
        if let Some(api_key) = &request.api_key {
            env.set(OPENAI_API_KEY, api_key);
        }
        env
    }

    /// Sets a variable, replacing any earlier value for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Same pairs as `iter`, with secret values masked. Safe to log.
    pub fn redacted(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().map(|(name, value)| {
            if is_secret(name) {
                (name, REDACTED)
            } else {
                (name, value)
            }
        })
    }
}

fn is_secret(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    ["KEY", "TOKEN", "SECRET", "PASSWORD"]
        .iter()
        .any(|marker| upper.contains(marker))
}
