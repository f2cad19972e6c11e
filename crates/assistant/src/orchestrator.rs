//! Response orchestrator.
//!
//! Decides where each reply comes from. In remote mode the completion client
//! is tried under a hard timeout; when it is unavailable the local responder
//! answers instead, unless fallback is disabled, in which case the failure is
//! returned to the caller. Local mode never touches the network.
//!
//! Built once per process and shared by `Arc`. The mode is an atomic flag and
//! the conversation log sits behind one mutex that is never held across an
//! await.

use crate::classifier::classify;
use crate::history::ConversationLog;
use crate::responder::LocalResponder;
use chrono::{DateTime, Utc};
use piste_config::AppConfig;
use piste_core::error::{Error, RemoteUnavailable, Result};
use piste_core::{
    AiStatus, AssistantMode, CompletionClient, CompletionRequest, ConversationTurn,
    IntentCategory,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message sent by the connection test.
pub const PROBE_MESSAGE: &str = "你好";

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Remote,
    Local,
    /// Remote mode, but the remote client was unavailable
    LocalFallback,
}

/// One answered message.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub intent: IntentCategory,
    pub source: ReplySource,
    pub timestamp: DateTime<Utc>,
}

/// Orchestrator tuning, usually taken from `AppConfig`.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Start in remote mode (only honoured when a client exists)
    pub remote_enabled: bool,
    pub fallback_to_local: bool,
    pub history_cap: usize,
    /// User/assistant pairs passed to the remote client
    pub context_pairs: usize,
    /// Hard limit on one remote call
    pub remote_timeout: Duration,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            fallback_to_local: true,
            history_cap: 50,
            context_pairs: 5,
            remote_timeout: Duration::from_secs(30),
        }
    }
}

impl AssistantSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            remote_enabled: config.remote.enabled,
            fallback_to_local: config.assistant.fallback_to_local,
            history_cap: config.assistant.history_cap,
            context_pairs: config.assistant.context_pairs,
            remote_timeout: Duration::from_secs(config.remote.timeout_secs),
        }
    }
}

/// The chat assistant.
pub struct Assistant {
    responder: LocalResponder,
    remote: Option<Arc<dyn CompletionClient>>,
    remote_mode: AtomicBool,
    settings: AssistantSettings,
    log: Mutex<ConversationLog>,
}

impl Assistant {
    pub fn new(
        responder: LocalResponder,
        remote: Option<Arc<dyn CompletionClient>>,
        settings: AssistantSettings,
    ) -> Self {
        let remote_mode = settings.remote_enabled && remote.is_some();
        info!(
            mode = if remote_mode { "remote" } else { "local" },
            remote = remote.as_ref().map(|r| r.name()).unwrap_or("none"),
            fallback = settings.fallback_to_local,
            "Assistant initialized"
        );

        Self {
            responder,
            remote,
            remote_mode: AtomicBool::new(remote_mode),
            log: Mutex::new(ConversationLog::new(settings.history_cap)),
            settings,
        }
    }

    /// Built-in knowledge, settings from `config`.
    pub fn from_config(config: &AppConfig, remote: Option<Arc<dyn CompletionClient>>) -> Self {
        Self::new(
            LocalResponder::builtin(),
            remote,
            AssistantSettings::from_config(config),
        )
    }

    fn log(&self) -> MutexGuard<'_, ConversationLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn responder(&self) -> &LocalResponder {
        &self.responder
    }

    pub fn mode(&self) -> AssistantMode {
        if self.remote_mode.load(Ordering::SeqCst) {
            AssistantMode::Remote
        } else {
            AssistantMode::Local
        }
    }

    /// Switch modes. Idempotent; returns the resulting status.
    pub fn switch_mode(&self, mode: AssistantMode) -> AiStatus {
        let previous = self
            .remote_mode
            .swap(mode == AssistantMode::Remote, Ordering::SeqCst);
        if previous != (mode == AssistantMode::Remote) {
            info!(%mode, "Assistant mode switched");
        }
        self.status()
    }

    pub fn status(&self) -> AiStatus {
        let (turn_count, last_activity) = {
            let log = self.log();
            (log.len(), log.last_activity())
        };

        AiStatus {
            mode: self.mode(),
            remote_enabled: self.settings.remote_enabled,
            remote_configured: self.remote.is_some(),
            fallback_enabled: self.settings.fallback_to_local,
            remote_name: self.remote.as_ref().map(|r| r.name().to_string()),
            turn_count,
            last_activity,
        }
    }

    /// Answer a message and record both turns in the log.
    ///
    /// Blank messages are `InvalidInput`. In remote mode with fallback
    /// disabled, an unavailable remote is returned as `Error::Remote` and
    /// nothing is logged.
    pub async fn handle(&self, message: &str, video_context: &str) -> Result<Reply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("message is required".into()));
        }
        let video_context = video_context.trim();

        let intent = classify(message);
        debug!(%intent, mode = %self.mode(), "Handling chat message");

        let (text, source) = match self.mode() {
            AssistantMode::Local => (
                self.responder.respond(intent, message, video_context),
                ReplySource::Local,
            ),
            AssistantMode::Remote => match self.try_remote(message, video_context).await {
                Ok(text) => (text, ReplySource::Remote),
                Err(e) if self.settings.fallback_to_local => {
                    warn!(reason = e.reason(), error = %e, "Remote unavailable, answering locally");
                    (
                        self.responder.respond(intent, message, video_context),
                        ReplySource::LocalFallback,
                    )
                }
                Err(e) => {
                    warn!(reason = e.reason(), error = %e, "Remote unavailable and fallback disabled");
                    return Err(e.into());
                }
            },
        };

        let user_turn = ConversationTurn::user(message)?.with_video_context(video_context);
        let reply_turn = ConversationTurn::assistant(text.as_str())?;
        let timestamp = reply_turn.timestamp;
        {
            let mut log = self.log();
            log.push(user_turn);
            log.push(reply_turn);
        }

        Ok(Reply {
            text,
            intent,
            source,
            timestamp,
        })
    }

    async fn try_remote(
        &self,
        message: &str,
        video_context: &str,
    ) -> std::result::Result<String, RemoteUnavailable> {
        let Some(client) = self.remote.as_ref() else {
            return Err(RemoteUnavailable::NotConfigured(
                "no remote API key configured".into(),
            ));
        };

        let (history, rounds) = {
            let log = self.log();
            (log.recent(self.settings.context_pairs * 2), log.len() / 2)
        };
        let request = CompletionRequest::new(message)
            .with_video_context(video_context)
            .with_history(history)
            .with_prior_rounds(rounds);

        self.call_with_timeout(client.as_ref(), request).await
    }

    async fn call_with_timeout(
        &self,
        client: &dyn CompletionClient,
        request: CompletionRequest,
    ) -> std::result::Result<String, RemoteUnavailable> {
        let timeout = self.settings.remote_timeout;
        match tokio::time::timeout(timeout, client.complete(request)).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(RemoteUnavailable::EmptyResponse),
            Ok(result) => result,
            Err(_) => Err(RemoteUnavailable::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Probe the remote client with one short message. Never errors.
    pub async fn test_connection(&self) -> bool {
        let Some(client) = self.remote.as_ref() else {
            info!("Connection test skipped: no remote client configured");
            return false;
        };

        match self
            .call_with_timeout(client.as_ref(), CompletionRequest::new(PROBE_MESSAGE))
            .await
        {
            Ok(_) => {
                info!(remote = client.name(), "Connection test succeeded");
                true
            }
            Err(e) => {
                warn!(remote = client.name(), reason = e.reason(), error = %e, "Connection test failed");
                false
            }
        }
    }

    /// Snapshot of the conversation log, oldest first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.log().turns()
    }

    /// Empty the log, returning how many turns were removed.
    pub fn clear_history(&self) -> usize {
        let removed = self.log().clear();
        info!(removed, "Conversation history cleared");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedClient(&'static str);

    #[async_trait]
    impl CompletionClient for FixedClient {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<String, RemoteUnavailable> {
            Ok(self.0.to_string())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<String, RemoteUnavailable> {
            Err(RemoteUnavailable::Http {
                status_code: 500,
                message: "boom".into(),
            })
        }
    }

    struct SlowClient;

    #[async_trait]
    impl CompletionClient for SlowClient {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<String, RemoteUnavailable> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<String, RemoteUnavailable> {
            let n = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request);
                requests.len()
            };
            Ok(format!("回答{n}"))
        }
    }

    fn assistant(remote: Option<Arc<dyn CompletionClient>>, fallback: bool) -> Assistant {
        Assistant::new(
            LocalResponder::builtin(),
            remote,
            AssistantSettings {
                fallback_to_local: fallback,
                remote_timeout: Duration::from_secs(1),
                ..AssistantSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn local_mode_answers_from_knowledge() {
        let a = assistant(None, true);
        assert_eq!(a.mode(), AssistantMode::Local);

        let reply = a.handle("击剑比赛如何计分？", "").await.unwrap();
        assert_eq!(reply.intent, IntentCategory::RulesInquiry);
        assert_eq!(reply.source, ReplySource::Local);
        assert!(reply.text.contains("15"));
        assert!(reply.text.contains("得1分"));
        assert_eq!(a.history().len(), 2);
    }

    #[tokio::test]
    async fn blank_message_is_invalid_input() {
        let a = assistant(None, true);
        let err = a.handle("   ", "").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(a.history().is_empty());
    }

    #[tokio::test]
    async fn remote_mode_uses_remote_client() {
        let a = assistant(Some(Arc::new(FixedClient("远程回答"))), true);
        assert_eq!(a.mode(), AssistantMode::Remote);

        let reply = a.handle("什么是优先权？", "花剑决赛").await.unwrap();
        assert_eq!(reply.text, "远程回答");
        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(reply.intent, IntentCategory::RulesInquiry);

        let history = a.history();
        assert_eq!(history[0].video_context.as_deref(), Some("花剑决赛"));
        assert_eq!(history[1].text, "远程回答");
    }

    #[tokio::test]
    async fn remote_failure_falls_back() {
        let a = assistant(Some(Arc::new(FailingClient)), true);
        let reply = a.handle("击剑比赛如何计分？", "").await.unwrap();
        assert_eq!(reply.source, ReplySource::LocalFallback);
        assert!(reply.text.contains("得1分"));
    }

    #[tokio::test]
    async fn remote_failure_surfaces_without_fallback() {
        let a = assistant(Some(Arc::new(FailingClient)), false);
        let err = a.handle("击剑比赛如何计分？", "").await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteUnavailable::Http { status_code: 500, .. })));
        assert!(a.history().is_empty());
    }

    #[tokio::test]
    async fn blank_remote_text_falls_back() {
        let a = assistant(Some(Arc::new(FixedClient("   "))), true);
        let reply = a.handle("什么是优先权", "").await.unwrap();
        assert_eq!(reply.source, ReplySource::LocalFallback);
        assert!(!reply.text.trim().is_empty());
        assert_eq!(a.history().len(), 2);
    }

    #[tokio::test]
    async fn blank_remote_text_without_fallback_is_empty_response() {
        let a = assistant(Some(Arc::new(FixedClient("   "))), false);
        let err = a.handle("什么是优先权", "").await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteUnavailable::EmptyResponse)));
        assert!(!err.is_client_error());
        assert!(a.history().is_empty());
        assert!(!a.test_connection().await);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out_and_falls_back() {
        let a = assistant(Some(Arc::new(SlowClient)), true);
        let reply = a.handle("花剑是什么", "").await.unwrap();
        assert_eq!(reply.source, ReplySource::LocalFallback);
        assert!(reply.text.contains("花剑"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_without_fallback_is_timeout() {
        let a = assistant(Some(Arc::new(SlowClient)), false);
        let err = a.handle("花剑是什么", "").await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteUnavailable::Timeout { timeout_secs: 1 })));
    }

    #[tokio::test]
    async fn remote_mode_without_client_is_not_configured() {
        let a = assistant(None, false);
        a.switch_mode(AssistantMode::Remote);
        let err = a.handle("你好", "").await.unwrap_err();
        assert!(matches!(err, Error::Remote(RemoteUnavailable::NotConfigured(_))));

        let b = assistant(None, true);
        b.switch_mode(AssistantMode::Remote);
        let reply = b.handle("你好", "").await.unwrap();
        assert_eq!(reply.source, ReplySource::LocalFallback);
    }

    #[tokio::test]
    async fn remote_receives_recent_history() {
        let client = Arc::new(RecordingClient::default());
        let a = Assistant::new(
            LocalResponder::builtin(),
            Some(client.clone()),
            AssistantSettings {
                context_pairs: 2,
                ..AssistantSettings::default()
            },
        );

        for i in 0..4 {
            a.handle(&format!("问题{i}"), "").await.unwrap();
        }

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].history.is_empty());
        let last = &requests[3];
        assert_eq!(last.message, "问题3");
        assert_eq!(last.history.len(), 4);
        assert_eq!(last.history[0].text, "问题1");
        assert_eq!(last.history[3].text, "回答3");
        assert_eq!(last.prior_rounds, 3);
        assert_eq!(requests[0].prior_rounds, 0);
    }

    #[tokio::test]
    async fn switching_to_local_twice_is_fine() {
        let a = assistant(Some(Arc::new(FixedClient("x"))), true);
        let first = a.switch_mode(AssistantMode::Local);
        let second = a.switch_mode(AssistantMode::Local);
        assert_eq!(first.mode, AssistantMode::Local);
        assert_eq!(second.mode, AssistantMode::Local);

        let reply = a.handle("击剑的历史起源是什么？", "").await.unwrap();
        assert_eq!(reply.source, ReplySource::Local);
    }

    #[tokio::test]
    async fn connection_test_without_client_is_false() {
        let a = assistant(None, true);
        a.switch_mode(AssistantMode::Remote);
        assert!(!a.test_connection().await);
    }

    #[tokio::test]
    async fn connection_test_reports_client_health() {
        assert!(assistant(Some(Arc::new(FixedClient("你好！"))), true).test_connection().await);
        assert!(!assistant(Some(Arc::new(FailingClient)), true).test_connection().await);
    }

    #[tokio::test]
    async fn status_reflects_state() {
        let a = assistant(None, true);
        let status = a.status();
        assert_eq!(status.mode, AssistantMode::Local);
        assert!(!status.remote_configured);
        assert!(status.fallback_enabled);
        assert_eq!(status.turn_count, 0);
        assert!(status.last_activity.is_none());

        a.handle("你好", "").await.unwrap();
        let status = a.status();
        assert_eq!(status.turn_count, 2);
        assert!(status.last_activity.is_some());
    }

    #[tokio::test]
    async fn log_stays_bounded() {
        let a = Assistant::new(
            LocalResponder::builtin(),
            None,
            AssistantSettings {
                history_cap: 5,
                ..AssistantSettings::default()
            },
        );
        for i in 0..10 {
            a.handle(&format!("问题{i}"), "").await.unwrap();
        }
        let history = a.history();
        assert_eq!(history.len(), 5);
        assert_eq!(history.last().unwrap().speaker, piste_core::Speaker::Assistant);
        assert_eq!(a.clear_history(), 5);
        assert!(a.history().is_empty());
    }
}
