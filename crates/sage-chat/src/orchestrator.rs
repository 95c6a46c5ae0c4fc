//! Chat orchestrator: owns every session and runs turns against them.
//!
//! A session binds one API key, one transcript, and one dispatcher. Each
//! session sits behind its own async mutex that is held for a whole turn,
//! so turns within a session never overlap while separate sessions proceed
//! independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use sage_core::config::ChatConfig;

use crate::capability::{CompletionProvider, SearchService};
use crate::classifier::QueryClassifier;
use crate::dispatcher::{Dispatcher, Reply};
use crate::error::ChatError;
use crate::handlers::HandlerSet;
use crate::transcript::ConversationLog;

/// Per-session state.
struct Session {
    id: Uuid,
    log: ConversationLog,
    dispatcher: Dispatcher,
    started_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl Session {
    fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            started_at: self.started_at.to_rfc3339(),
            last_message_at: self.last_message_at.to_rfc3339(),
            message_count: self.log.len(),
        }
    }
}

/// Listing view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub message_count: usize,
}

type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Central coordinator for sessions and turns.
pub struct ChatOrchestrator {
    classifier: QueryClassifier,
    completion: Arc<dyn CompletionProvider>,
    search: Arc<dyn SearchService>,
    default_api_key: Option<String>,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator. The routing table comes from `config.rules`
    /// when set, else the built-in keyword table.
    pub fn new(
        config: ChatConfig,
        completion: Arc<dyn CompletionProvider>,
        search: Arc<dyn SearchService>,
    ) -> Self {
        let classifier = match &config.rules {
            Some(rules) => QueryClassifier::new(rules.clone()),
            None => QueryClassifier::default(),
        };
        Self {
            classifier,
            completion,
            search,
            default_api_key: None,
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Key used when a session is opened without one (e.g. from the environment).
    pub fn with_default_api_key(mut self, api_key: Option<String>) -> Self {
        self.default_api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_default_api_key(&self) -> bool {
        self.default_api_key.is_some()
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Open a session, returning its id and the greeting-seeded transcript.
    ///
    /// A blank or absent key falls back to the default key; with neither the
    /// session is refused with [`ChatError::MissingApiKey`].
    pub fn open_session(
        &self,
        api_key: Option<&str>,
    ) -> Result<(Uuid, ConversationLog), ChatError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.default_api_key.as_deref())
            .ok_or(ChatError::MissingApiKey)?;

        let completion = self.completion.bind(api_key)?;
        let handlers = HandlerSet::from_services(completion, Arc::clone(&self.search));
        let dispatcher = Dispatcher::new(self.classifier.clone(), handlers);

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            log: ConversationLog::with_greeting(self.config.greeting.clone()),
            dispatcher,
            started_at: now,
            last_message_at: now,
        };
        let id = session.id;
        let log = session.log.clone();

        let mut sessions = self.lock_sessions()?;
        self.sweep_expired(&mut sessions);
        sessions.insert(id, Arc::new(tokio::sync::Mutex::new(session)));
        drop(sessions);
        info!(session_id = %id, "Session opened");
        Ok((id, log))
    }

    /// Run one turn in a session.
    ///
    /// Returns the reply and a snapshot of the transcript after the turn.
    pub async fn ask(
        &self,
        session_id: Uuid,
        question: &str,
    ) -> Result<(Reply, ConversationLog), ChatError> {
        let max = self.config.max_question_length;
        if question.trim().chars().count() > max {
            return Err(ChatError::QuestionTooLong(max));
        }

        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        self.check_expiry(&session)?;

        session.last_message_at = Utc::now();
        let Session {
            log, dispatcher, ..
        } = &mut *session;
        let reply = dispatcher.handle_turn(question, log).await?;
        Ok((reply, session.log.clone()))
    }

    /// Transcript of a session.
    pub async fn history(&self, session_id: Uuid) -> Result<ConversationLog, ChatError> {
        let handle = self.handle(session_id)?;
        let session = handle.lock().await;
        self.check_expiry(&session)?;
        Ok(session.log.clone())
    }

    pub async fn get_session(&self, session_id: Uuid) -> Option<SessionSummary> {
        let handle = self.handle(session_id).ok()?;
        let session = handle.lock().await;
        self.check_expiry(&session).ok()?;
        Some(session.summary())
    }

    /// Summaries of all live sessions, oldest first. Expired sessions are dropped.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = match self.lock_sessions() {
            Ok(sessions) => sessions.values().cloned().collect(),
            Err(_) => return vec![],
        };

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            if self.check_expiry(&session).is_ok() {
                summaries.push(session.summary());
            }
        }
        summaries.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        summaries
    }

    /// End a session and drop its transcript.
    pub fn close_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        match self.lock_sessions()?.remove(&session_id) {
            Some(_) => {
                info!(session_id = %session_id, "Session closed");
                Ok(())
            }
            None => Err(ChatError::SessionNotFound(session_id)),
        }
    }

    /// Number of live sessions. Expired sessions are swept first.
    pub fn session_count(&self) -> usize {
        self.lock_sessions()
            .map(|mut sessions| {
                self.sweep_expired(&mut sessions);
                sessions.len()
            })
            .unwrap_or(0)
    }

    // -- Private helpers --

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Internal(format!("session lock poisoned: {}", e)))
    }

    fn handle(&self, session_id: Uuid) -> Result<SessionHandle, ChatError> {
        self.lock_sessions()?
            .get(&session_id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    /// Drop every idle session. A session whose lock is held is mid-turn and
    /// therefore kept.
    fn sweep_expired(&self, sessions: &mut HashMap<Uuid, SessionHandle>) {
        if self.config.session_timeout_minutes == 0 {
            return;
        }
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !self.is_expired(&session),
            Err(_) => true,
        });
        let swept = before - sessions.len();
        if swept > 0 {
            info!(swept, remaining = sessions.len(), "Expired sessions swept");
        }
    }

    fn is_expired(&self, session: &Session) -> bool {
        let timeout = self.config.session_timeout_minutes;
        if timeout == 0 {
            return false;
        }
        Utc::now() - session.last_message_at > chrono::Duration::minutes(i64::from(timeout))
    }

    /// Drop the session and report it missing if it has been idle too long.
    fn check_expiry(&self, session: &Session) -> Result<(), ChatError> {
        if !self.is_expired(session) {
            return Ok(());
        }
        warn!(session_id = %session.id, "Session expired");
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&session.id);
        }
        Err(ChatError::SessionNotFound(session.id))
    }
}

// =============================================================================
// Tests
// =============================================================================
