//! Effects produced by state transitions

use crate::state_machine::state::Order;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the new state (stamps `last_interaction`)
    PersistState,

    /// Send a message back to the customer
    Reply { body: String },

    /// Store the order; the executor answers with `Event::OrderPlaced`
    CreateOrder { order: Order },

    /// Send a new-order summary to the operations channel
    NotifyKitchen { to: String, body: String },

    /// Reset the stored conversation to a fresh `Initial` state
    ClearConversation,
}

impl Effect {
    pub fn reply(body: impl Into<String>) -> Self {
        Effect::Reply { body: body.into() }
    }

    /// Outbound text carried by this effect, if any
    pub fn message_body(&self) -> Option<&str> {
        match self {
            Effect::Reply { body } | Effect::NotifyKitchen { body, .. } => Some(body),
            _ => None,
        }
    }
}
