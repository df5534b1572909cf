//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::db::Conversation;
use crate::messaging::MessagingError;
use crate::state_machine::{ConvState, MenuItem, Order};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory Storage
// ============================================================================

/// In-memory storage for testing
#[allow(dead_code)]
pub struct InMemoryStorage {
    menu: Mutex<Vec<MenuItem>>,
    conversations: Mutex<HashMap<String, Conversation>>,
    orders: Mutex<Vec<Order>>,
    fail_orders: AtomicBool,
    saves: AtomicUsize,
    clears: AtomicUsize,
    next_order: AtomicUsize,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_menu(Vec::new())
    }

    pub fn with_menu(menu: Vec<MenuItem>) -> Self {
        Self {
            menu: Mutex::new(menu),
            conversations: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            fail_orders: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            next_order: AtomicUsize::new(1),
        }
    }

    pub fn set_menu(&self, menu: Vec<MenuItem>) {
        *self.menu.lock().unwrap() = menu;
    }

    /// Make every `create_order` call fail
    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn put_state(&self, phone_number: &str, state: ConvState) {
        let mut conversation = Conversation::new(phone_number);
        conversation.state = state;
        self.conversations
            .lock()
            .unwrap()
            .insert(phone_number.to_string(), conversation);
    }

    pub fn state_of(&self, phone_number: &str) -> Option<ConvState> {
        self.conversations
            .lock()
            .unwrap()
            .get(phone_number)
            .map(|c| c.state.clone())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MenuStore for InMemoryStorage {
    async fn get_menu(&self) -> Vec<MenuItem> {
        self.menu.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStorage {
    async fn get_conversation(&self, phone_number: &str) -> Result<Option<Conversation>, String> {
        let conversation = self.conversations.lock().unwrap().get(phone_number).cloned();
        // Widen the read-modify-write window so unserialized callers would interleave
        tokio::task::yield_now().await;
        Ok(conversation)
    }

    async fn save_conversation(&self, conversation: &mut Conversation) -> Result<(), String> {
        conversation.last_interaction = Utc::now();
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.phone_number.clone(), conversation.clone());
        Ok(())
    }

    async fn clear_conversation(&self, phone_number: &str) -> Result<(), String> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.conversations
            .lock()
            .unwrap()
            .insert(phone_number.to_string(), Conversation::new(phone_number));
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStorage {
    async fn create_order(&self, order: &Order) -> Result<Order, String> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err("order store unavailable".to_string());
        }
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        let mut stored = order.clone();
        stored.order_id = Some(format!("order-{n}"));
        self.orders.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

// ============================================================================
// Mock Sender
// ============================================================================

/// Records every outbound message
#[allow(dead_code)]
pub struct MockSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl MockSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every send fail
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All `(to, body)` pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_body_to(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(dest, _)| dest == to)
            .map(|(_, body)| body.clone())
    }
}

impl Default for MockSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), MessagingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessagingError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}
