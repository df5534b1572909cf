//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Conversation, Database};
use crate::messaging::MessagingError;
use crate::state_machine::{MenuItem, Order};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only catalog
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Full catalog; empty when unavailable
    async fn get_menu(&self) -> Vec<MenuItem>;
}

/// Per-identity conversation records
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_conversation(&self, phone_number: &str) -> Result<Option<Conversation>, String>;

    /// Upsert the record; stamps `last_interaction`
    async fn save_conversation(&self, conversation: &mut Conversation) -> Result<(), String>;

    /// Reset to a fresh `Initial` record with an empty cart
    async fn clear_conversation(&self, phone_number: &str) -> Result<(), String>;
}

/// Finalized orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Store the order and return it with its assigned id
    async fn create_order(&self, order: &Order) -> Result<Order, String>;
}

/// Outbound text channel
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError>;
}

/// Combined storage trait for convenience
pub trait Storage: MenuStore + ConversationStore + OrderStore {}
impl<T: MenuStore + ConversationStore + OrderStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MenuStore + ?Sized> MenuStore for Arc<T> {
    async fn get_menu(&self) -> Vec<MenuItem> {
        (**self).get_menu().await
    }
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for Arc<T> {
    async fn get_conversation(&self, phone_number: &str) -> Result<Option<Conversation>, String> {
        (**self).get_conversation(phone_number).await
    }

    async fn save_conversation(&self, conversation: &mut Conversation) -> Result<(), String> {
        (**self).save_conversation(conversation).await
    }

    async fn clear_conversation(&self, phone_number: &str) -> Result<(), String> {
        (**self).clear_conversation(phone_number).await
    }
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn create_order(&self, order: &Order) -> Result<Order, String> {
        (**self).create_order(order).await
    }
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        (**self).send(to, body).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MenuStore for DatabaseStorage {
    async fn get_menu(&self) -> Vec<MenuItem> {
        self.db.get_menu().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load menu");
            Vec::new()
        })
    }
}

#[async_trait]
impl ConversationStore for DatabaseStorage {
    async fn get_conversation(&self, phone_number: &str) -> Result<Option<Conversation>, String> {
        self.db
            .get_conversation(phone_number)
            .map_err(|e| e.to_string())
    }

    async fn save_conversation(&self, conversation: &mut Conversation) -> Result<(), String> {
        self.db
            .save_conversation(conversation)
            .map_err(|e| e.to_string())
    }

    async fn clear_conversation(&self, phone_number: &str) -> Result<(), String> {
        self.db
            .clear_conversation(phone_number)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl OrderStore for DatabaseStorage {
    async fn create_order(&self, order: &Order) -> Result<Order, String> {
        self.db.create_order(order).map_err(|e| e.to_string())
    }
}
