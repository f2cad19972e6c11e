//! Assistant mode and status snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Where replies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Try the remote completion client first
    Remote,
    /// Answer from the built-in knowledge only
    #[default]
    Local,
}

impl AssistantMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantMode::Remote => "remote",
            AssistantMode::Local => "local",
        }
    }
}

impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "deepseek" => Ok(AssistantMode::Remote),
            "local" => Ok(AssistantMode::Local),
            other => Err(Error::InvalidInput(format!(
                "unknown mode '{other}', expected 'remote' or 'local'"
            ))),
        }
    }
}

/// Point-in-time view of the assistant, served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiStatus {
    /// Current mode
    pub mode: AssistantMode,

    /// Remote mode is switched on in configuration
    pub remote_enabled: bool,

    /// A remote client exists (an API key was supplied)
    pub remote_configured: bool,

    /// Remote failures fall back to the local responder
    pub fallback_enabled: bool,

    /// Name of the remote backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_name: Option<String>,

    /// Number of turns in the conversation log
    pub turn_count: usize,

    /// Timestamp of the most recent turn
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_case_insensitively() {
        assert_eq!("Remote".parse::<AssistantMode>().unwrap(), AssistantMode::Remote);
        assert_eq!(" local ".parse::<AssistantMode>().unwrap(), AssistantMode::Local);
        assert_eq!("deepseek".parse::<AssistantMode>().unwrap(), AssistantMode::Remote);
    }

    #[test]
    fn unknown_mode_is_invalid_input() {
        let err = "cloud".parse::<AssistantMode>().unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("cloud"));
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AssistantMode::Remote).unwrap(), "\"remote\"");
        assert_eq!(AssistantMode::default(), AssistantMode::Local);
    }
}
