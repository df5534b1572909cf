//! Conversation runtime executor

use super::traits::{MessageSender, Storage};
use super::{InboundMessage, RuntimeError};
use crate::db::Conversation;
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Processes one identity's messages, one at a time
pub struct ConversationRuntime<S, M>
where
    S: Storage + 'static,
    M: MessageSender + 'static,
{
    phone_number: String,
    kitchen_number: Option<String>,
    storage: S,
    sender: M,
}

impl<S, M> ConversationRuntime<S, M>
where
    S: Storage + 'static,
    M: MessageSender + 'static,
{
    pub fn new(
        phone_number: impl Into<String>,
        kitchen_number: Option<String>,
        storage: S,
        sender: M,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            kitchen_number,
            storage,
            sender,
        }
    }

    /// Drain the inbox until it closes or stays quiet for `idle_timeout`.
    ///
    /// On idle timeout the inbox is closed first, so nothing can be queued
    /// behind the last drained message.
    pub async fn run(self, mut inbox: mpsc::Receiver<InboundMessage>, idle_timeout: Duration) {
        tracing::debug!(phone = %self.phone_number, "Starting conversation runtime");

        loop {
            match tokio::time::timeout(idle_timeout, inbox.recv()).await {
                Ok(Some(message)) => self.process(message).await,
                Ok(None) => break,
                Err(_) => {
                    inbox.close();
                    while let Ok(message) = inbox.try_recv() {
                        self.process(message).await;
                    }
                    break;
                }
            }
        }

        tracing::debug!(phone = %self.phone_number, "Conversation runtime stopped");
    }

    async fn process(&self, message: InboundMessage) {
        let result = self.handle_message(&message.text).await;
        if let Err(e) = &result {
            tracing::error!(phone = %self.phone_number, error = %e, "Error handling message");
        }
        // The webhook may have given up waiting
        let _ = message.done.send(result);
    }

    /// One full turn: load state, transition, execute effects
    pub async fn handle_message(&self, text: &str) -> Result<(), RuntimeError> {
        let mut conversation = self.load_or_create().await?;
        if matches!(conversation.state, ConvState::ConfirmingOrder { .. }) {
            tracing::warn!(phone = %self.phone_number, "Conversation parked in confirming_order; ignoring message");
        }
        let menu = self.storage.get_menu().await;
        let context = ConvContext::new(&self.phone_number, menu, Utc::now())
            .with_kitchen_number(self.kitchen_number.clone());

        // Effects may generate follow-up events; process them in a loop
        let mut events_to_process = vec![Event::user_message(text)];

        while let Some(event) = events_to_process.pop() {
            let result = transition(&conversation.state, &context, event)?;

            let old_state = std::mem::replace(&mut conversation.state, result.new_state);
            if old_state.name() != conversation.state.name() {
                tracing::info!(
                    phone = %self.phone_number,
                    from = old_state.name(),
                    to = conversation.state.name(),
                    "State transition"
                );
            }

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(&mut conversation, effect).await? {
                    events_to_process.push(generated);
                }
            }
        }

        Ok(())
    }

    async fn load_or_create(&self) -> Result<Conversation, RuntimeError> {
        if let Some(conversation) = self
            .storage
            .get_conversation(&self.phone_number)
            .await
            .map_err(RuntimeError::Storage)?
        {
            return Ok(conversation);
        }

        tracing::info!(phone = %self.phone_number, "New conversation");
        let mut conversation = Conversation::new(&self.phone_number);
        self.storage
            .save_conversation(&mut conversation)
            .await
            .map_err(RuntimeError::Storage)?;
        Ok(conversation)
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(
        &self,
        conversation: &mut Conversation,
        effect: Effect,
    ) -> Result<Option<Event>, RuntimeError> {
        match effect {
            Effect::PersistState => {
                self.storage
                    .save_conversation(conversation)
                    .await
                    .map_err(RuntimeError::Storage)?;
                Ok(None)
            }

            Effect::Reply { body } => {
                self.deliver(&self.phone_number, &body).await;
                Ok(None)
            }

            Effect::CreateOrder { order } => {
                let order = self
                    .storage
                    .create_order(&order)
                    .await
                    .map_err(RuntimeError::Storage)?;
                tracing::info!(
                    phone = %self.phone_number,
                    order_id = order.display_id(),
                    total = order.total_price,
                    "Order created"
                );
                Ok(Some(Event::OrderPlaced { order }))
            }

            Effect::NotifyKitchen { to, body } => {
                self.deliver(&to, &body).await;
                Ok(None)
            }

            Effect::ClearConversation => {
                self.storage
                    .clear_conversation(&self.phone_number)
                    .await
                    .map_err(RuntimeError::Storage)?;
                Ok(None)
            }
        }
    }

    /// Best-effort send: failures are logged, never propagated
    async fn deliver(&self, to: &str, body: &str) {
        if let Err(e) = self.sender.send(to, body).await {
            tracing::warn!(to = %to, error = %e, "Failed to send message");
        }
    }
}
