//! Database schema and types

pub use crate::state_machine::state::ConvState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS menu_items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price REAL NOT NULL CHECK (price >= 0),
    category TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_menu_items_position ON menu_items(position, id);

CREATE TABLE IF NOT EXISTS conversations (
    phone_number TEXT PRIMARY KEY,
    state TEXT NOT NULL DEFAULT '{"type":"initial"}',
    last_interaction TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    order_id TEXT PRIMARY KEY,
    customer_phone TEXT NOT NULL,
    items TEXT NOT NULL,
    total_price REAL NOT NULL,
    status TEXT NOT NULL,
    address TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_phone, created_at DESC);
"#;

/// Per-identity conversation record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub phone_number: String,
    pub state: ConvState,
    /// Advisory only; stamped on every save
    pub last_interaction: DateTime<Utc>,
}

impl Conversation {
    /// Fresh record for a first-time identity
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            state: ConvState::Initial,
            last_interaction: Utc::now(),
        }
    }
}
