//! Remote chat-completion clients for piste.
//!
//! Every client implements `piste_core::CompletionClient`. Only the
//! OpenAI-compatible wire format is needed: DeepSeek, OpenAI and most hosted
//! models speak it.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use piste_config::{AppConfig, ConfigError};
use piste_core::CompletionClient;
use std::sync::Arc;

/// Build the remote client described by `config`.
///
/// Returns `Ok(None)` when no API key is configured; the assistant then runs
/// local-only and reports the remote as not configured.
pub fn build_from_config(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CompletionClient>>, ConfigError> {
    let Some(api_key) = config.remote.api_key.as_deref() else {
        tracing::info!("No remote API key configured, remote completion disabled");
        return Ok(None);
    };

    let client = OpenAiCompatClient::from_config(api_key, &config.remote, &config.assistant)
        .map_err(|e| ConfigError::ValidationError(format!("remote client: {e}")))?;
    Ok(Some(Arc::new(client)))
}
