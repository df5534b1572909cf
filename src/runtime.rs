//! Runtime for executing conversations
//!
//! Each customer identity gets its own queue and worker task, so turns for
//! the same phone number never overlap while different numbers run in
//! parallel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::state_machine::transition::TransitionError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

const INBOX_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("conversation runtime unavailable")]
    RuntimeUnavailable,
}

/// A queued customer message and the channel its outcome is reported on
#[derive(Debug)]
pub struct InboundMessage {
    pub text: String,
    pub done: oneshot::Sender<Result<(), RuntimeError>>,
}

/// Handle to a running conversation worker
#[derive(Clone)]
struct ConversationHandle {
    inbox: mpsc::Sender<InboundMessage>,
    /// Distinguishes a respawned worker from the one it replaced
    generation: u64,
    /// Held by the worker for its whole life; a replacement waits on it
    turn: Arc<Mutex<()>>,
}

type Registry = Arc<RwLock<HashMap<String, ConversationHandle>>>;

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    storage: Arc<dyn Storage>,
    sender: Arc<dyn MessageSender>,
    kitchen_number: Option<String>,
    idle_timeout: Duration,
    runtimes: Registry,
    next_generation: AtomicU64,
}

impl RuntimeManager {
    pub fn new(
        storage: Arc<dyn Storage>,
        sender: Arc<dyn MessageSender>,
        kitchen_number: Option<String>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            sender,
            kitchen_number,
            idle_timeout,
            runtimes: Arc::new(RwLock::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Queue a message for `phone_number` and wait until its turn completes
    pub async fn dispatch(&self, phone_number: &str, text: String) -> Result<(), RuntimeError> {
        let mut message = text;

        // A worker may stop on idle between lookup and send; retry once on a fresh one
        for _ in 0..2 {
            let handle = self.get_or_create(phone_number).await;
            let (done_tx, done_rx) = oneshot::channel();
            let inbound = InboundMessage {
                text: message,
                done: done_tx,
            };

            match handle.inbox.send(inbound).await {
                Ok(()) => {
                    return done_rx
                        .await
                        .unwrap_or(Err(RuntimeError::RuntimeUnavailable));
                }
                Err(mpsc::error::SendError(returned)) => {
                    tracing::debug!(phone = %phone_number, "Conversation runtime stopped, respawning");
                    message = returned.text;
                }
            }
        }

        Err(RuntimeError::RuntimeUnavailable)
    }

    async fn get_or_create(&self, phone_number: &str) -> ConversationHandle {
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(phone_number) {
                if !handle.inbox.is_closed() {
                    return handle.clone();
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another caller may have spawned one while we waited for the lock
        let previous = match runtimes.get(phone_number) {
            Some(handle) if !handle.inbox.is_closed() => return handle.clone(),
            Some(handle) => Some(handle.turn.clone()),
            None => None,
        };

        // A closed worker may still be draining; its replacement shares the turn lock
        let turn = previous.unwrap_or_default();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let runtime = ConversationRuntime::new(
            phone_number,
            self.kitchen_number.clone(),
            self.storage.clone(),
            self.sender.clone(),
        );

        let registry = self.runtimes.clone();
        let phone = phone_number.to_string();
        let idle_timeout = self.idle_timeout;
        let worker_turn = turn.clone();
        tokio::spawn(async move {
            let _turn = worker_turn.lock_owned().await;
            runtime.run(inbox_rx, idle_timeout).await;
            unregister(&registry, &phone, generation).await;
        });

        let handle = ConversationHandle {
            inbox: inbox_tx,
            generation,
            turn,
        };
        runtimes.insert(phone_number.to_string(), handle.clone());
        handle
    }

    /// Number of registered workers
    #[cfg(test)]
    async fn worker_count(&self) -> usize {
        self.runtimes.read().await.len()
    }
}

/// Drop the registry entry if it still belongs to the exiting worker
async fn unregister(registry: &Registry, phone_number: &str, generation: u64) {
    let mut runtimes = registry.write().await;
    if runtimes
        .get(phone_number)
        .is_some_and(|h| h.generation == generation)
    {
        runtimes.remove(phone_number);
    }
}
