//! FlowRunner – loads a session, feeds one user message through the dialogue, carries out the
//! resulting effects and persists the session again.
//!
//! ## Turn model
//! * Each message for a session is handled under that session's lock, so a turn (echo, reply
//!   delay, state transition, save) finishes before the next message is interpreted.
//! * The lock is **not** held while a prediction is in flight. Messages arriving in that window
//!   are echoed and queued by the dialogue; once the prediction resolves, the runner re-acquires
//!   the lock, applies the outcome and the queue is replayed in arrival order.
//! * Every dispatch is bounded by [`RunnerSettings::dispatch_timeout`]; expiry is reported to
//!   the user like any other failed prediction.
//! * A turn runs on a spawned task, so a caller that stops waiting (client disconnect, aborted
//!   task) never leaves the session in `Processing`.
//! * Sessions idle for longer than the configured TTL are swept by [`FlowRunner::expire_idle`].
//!
//! ```rust,ignore
//! let runner = FlowRunner::from_config(&config, Arc::new(InMemorySessionStorage::new()))?;
//! let session = runner.open().await?;
//! let replies = runner.send(&session.id, "Will my project be delayed?").await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    config::AssistantConfig,
    dialogue::{DialogueEngine, Effect, Event, Phase},
    error::{DispatchError, FlowError, Result},
    message::ChatMessage,
    payload::PredictionRequest,
    prediction::{HttpPredictionClient, PredictionClient, PredictionResult},
    storage::{Session, SessionStorage},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerSettings {
    /// Pause before replying, so answers do not appear instantly
    pub reply_delay: Duration,
    pub dispatch_timeout: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            reply_delay: Duration::ZERO,
            dispatch_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AssistantConfig> for RunnerSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            reply_delay: config.reply_delay,
            dispatch_timeout: config.prediction.timeout,
        }
    }
}

/// High-level helper that orchestrates the _load → step → dispatch → save_ cycle.
#[derive(Clone)]
pub struct FlowRunner {
    engine: Arc<DialogueEngine>,
    storage: Arc<dyn SessionStorage>,
    client: Arc<dyn PredictionClient>,
    settings: RunnerSettings,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FlowRunner {
    pub fn new(
        engine: Arc<DialogueEngine>,
        storage: Arc<dyn SessionStorage>,
        client: Arc<dyn PredictionClient>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            engine,
            storage,
            client,
            settings,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Runner backed by the HTTP prediction client described by `config`
    pub fn from_config(config: &AssistantConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let engine = DialogueEngine::new(config.load_imputation_table()?, config.pending_input_limit);
        let client = HttpPredictionClient::new(config.prediction.clone())?;
        Ok(Self::new(
            Arc::new(engine),
            storage,
            Arc::new(client),
            RunnerSettings::from(config),
        ))
    }

    /// Start a conversation (the chat widget was opened)
    pub async fn open(&self) -> Result<Session> {
        let session = Session::with_random_id();
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "Opened chat session");
        Ok(session)
    }

    /// Discard a conversation (the chat widget was closed). A prediction still in flight for it
    /// completes but its outcome is dropped.
    pub async fn close(&self, session_id: &str) -> Result<()> {
        self.storage.delete(session_id).await?;
        self.locks.remove(session_id);
        info!(session_id = %session_id, "Closed chat session");
        Ok(())
    }

    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    /// Handle one user message and return the assistant messages it produced, in transcript
    /// order. A message queued behind an in-flight prediction returns no replies; its answer is
    /// returned by the call that owns the prediction.
    ///
    /// The turn runs on its own task: dropping the returned future does not stop it, so a
    /// dispatched prediction is always resolved into the session.
    pub async fn send(&self, session_id: &str, text: &str) -> Result<Vec<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FlowError::EmptyInput);
        }

        let runner = self.clone();
        let (session_id, text) = (session_id.to_string(), text.to_string());
        tokio::spawn(async move { runner.run_turn(&session_id, &text).await })
            .await
            .map_err(|e| FlowError::TurnAborted(e.to_string()))?
    }

    async fn run_turn(&self, session_id: &str, text: &str) -> Result<Vec<ChatMessage>> {
        let lock = self.lock_for(session_id);
        let mut replies = Vec::new();

        let mut pending = {
            let _turn = lock.lock().await;
            let mut session = match self.session(session_id).await {
                Ok(session) => session,
                Err(e) => {
                    self.locks.remove(session_id);
                    return Err(e);
                }
            };

            session.transcript.push(ChatMessage::user(text));
            if session.dialogue.phase != Phase::Processing && !self.settings.reply_delay.is_zero() {
                self.persist(session.clone()).await?;
                tokio::time::sleep(self.settings.reply_delay).await;
            }

            let request = self.apply(&mut session, Event::UserText(text.to_string()), &mut replies);
            self.persist(session).await?;
            request
        };

        while let Some(request) = pending {
            let outcome = self.dispatch(session_id, &request).await;

            let _turn = lock.lock().await;
            let Some(mut session) = self.storage.get(session_id).await? else {
                warn!(session_id = %session_id, "Session closed before prediction resolved");
                break;
            };
            pending = self.apply(&mut session, Event::PredictionResolved(outcome), &mut replies);
            self.persist(session).await?;
        }

        Ok(replies)
    }

    /// Discard sessions with no turn for `max_idle` (widgets closed without a goodbye).
    /// Returns how many were removed.
    pub async fn expire_idle(&self, max_idle: Duration) -> Result<usize> {
        let max_idle = chrono::Duration::from_std(max_idle)
            .map_err(|e| FlowError::Config(format!("idle ttl out of range: {e}")))?;
        let expired = self.storage.expire_before(Utc::now() - max_idle).await?;
        for id in &expired {
            self.locks.remove(id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired idle chat sessions");
        }
        Ok(expired.len())
    }

    /// Run [`FlowRunner::expire_idle`] every `every` until the handle is aborted
    pub fn spawn_idle_sweeper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = runner.expire_idle(max_idle).await {
                    warn!(error = %e, "Idle session sweep failed");
                }
            }
        })
    }

    async fn persist(&self, mut session: Session) -> Result<()> {
        session.updated_at = Utc::now();
        self.storage.save(session).await
    }

    fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Run one dialogue step, append its replies to the transcript and hand back any request to
    /// dispatch.
    fn apply(
        &self,
        session: &mut Session,
        event: Event,
        replies: &mut Vec<ChatMessage>,
    ) -> Option<PredictionRequest> {
        let transition = self.engine.step(std::mem::take(&mut session.dialogue), event);
        session.dialogue = transition.session;

        let mut request = None;
        for effect in transition.effects {
            match effect {
                Effect::Reply(message) => {
                    session.transcript.push(message.clone());
                    replies.push(message);
                }
                Effect::Dispatch(next) => request = Some(next),
            }
        }
        request
    }

    async fn dispatch(
        &self,
        session_id: &str,
        request: &PredictionRequest,
    ) -> std::result::Result<PredictionResult, DispatchError> {
        let started = Instant::now();
        let timeout = self.settings.dispatch_timeout;

        let outcome = match tokio::time::timeout(timeout, self.client.predict(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DispatchError::Timeout(timeout)),
        };

        match &outcome {
            Ok(_) => info!(
                session_id = %session_id,
                domain = %request.domain,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Prediction received"
            ),
            Err(e) => warn!(
                session_id = %session_id,
                domain = %request.domain,
                error = %e,
                "Prediction failed"
            ),
        }
        debug!(session_id = %session_id, "Dispatch finished");
        outcome
    }
}
