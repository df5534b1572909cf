//! Database module for the ordering bot
//!
//! Provides persistence for the menu, per-identity conversation state and
//! finalized orders.

mod schema;

pub use schema::*;

use crate::state_machine::{MenuItem, Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot read menu seed {path}: {source}")]
    Seed {
        path: String,
        source: std::io::Error,
    },
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Menu Operations ====================

    /// Full catalog in display order
    pub fn get_menu(&self) -> DbResult<Vec<MenuItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, price, category
             FROM menu_items ORDER BY position ASC, id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(MenuItem {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                price: row.get(3)?,
                category: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Insert or replace a catalog entry
    pub fn upsert_menu_item(&self, item: &MenuItem, position: i64) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO menu_items (id, name, description, price, category, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price = excluded.price,
                category = excluded.category,
                position = excluded.position",
            params![
                item.id,
                item.name,
                item.description,
                item.price,
                item.category,
                position
            ],
        )?;
        Ok(())
    }

    /// Import a JSON array of menu items, keeping file order as display order.
    /// Returns the number of items imported.
    pub fn seed_menu_from_file<P: AsRef<Path>>(&self, path: P) -> DbResult<usize> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DbError::Seed {
            path: path.display().to_string(),
            source,
        })?;
        let items: Vec<MenuItem> = serde_json::from_str(&raw)?;

        for (position, item) in (0_i64..).zip(&items) {
            self.upsert_menu_item(item, position)?;
        }
        Ok(items.len())
    }

    // ==================== Conversation Operations ====================

    /// Get the conversation for an identity, if one exists
    pub fn get_conversation(&self, phone_number: &str) -> DbResult<Option<Conversation>> {
        let conn = self.conn()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT state, last_interaction FROM conversations WHERE phone_number = ?1",
                params![phone_number],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(state_json, last_interaction)| Conversation {
            phone_number: phone_number.to_string(),
            state: parse_state(phone_number, &state_json),
            last_interaction: parse_datetime(&last_interaction),
        }))
    }

    /// Upsert the conversation, stamping `last_interaction`
    pub fn save_conversation(&self, conversation: &mut Conversation) -> DbResult<()> {
        conversation.last_interaction = Utc::now();
        let state_json = serde_json::to_string(&conversation.state)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO conversations (phone_number, state, last_interaction)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(phone_number) DO UPDATE SET
                state = excluded.state,
                last_interaction = excluded.last_interaction",
            params![
                conversation.phone_number,
                state_json,
                conversation.last_interaction.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Reset an identity to a fresh `Initial` state with an empty cart.
    /// The row is kept for the next order cycle.
    pub fn clear_conversation(&self, phone_number: &str) -> DbResult<Conversation> {
        let mut fresh = Conversation::new(phone_number);
        self.save_conversation(&mut fresh)?;
        Ok(fresh)
    }

    // ==================== Order Operations ====================

    /// Store an order and assign its id
    pub fn create_order(&self, order: &Order) -> DbResult<Order> {
        let order_id = uuid::Uuid::new_v4().to_string();
        let items_json = serde_json::to_string(&order.items)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO orders (order_id, customer_phone, items, total_price, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                order_id,
                order.customer_phone,
                items_json,
                order.total_price,
                order.status.as_str(),
                order.address,
                order.created_at.to_rfc3339()
            ],
        )?;

        Ok(Order {
            order_id: Some(order_id),
            ..order.clone()
        })
    }

    /// Get an order by id
    #[allow(dead_code)] // Used in tests
    pub fn get_order(&self, order_id: &str) -> DbResult<Order> {
        let conn = self.conn()?;
        let row: Option<(String, String, f64, String, String, String)> = conn
            .query_row(
                "SELECT customer_phone, items, total_price, status, address, created_at
                 FROM orders WHERE order_id = ?1",
                params![order_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((customer_phone, items_json, total_price, status, address, created_at)) = row
        else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        let items: Vec<OrderItem> = serde_json::from_str(&items_json)?;

        Ok(Order {
            order_id: Some(order_id.to_string()),
            customer_phone,
            items,
            total_price,
            status: OrderStatus::parse(&status),
            address,
            created_at: parse_datetime(&created_at),
        })
    }
}

/// Undecodable state falls back to `Initial` so the customer can start over
fn parse_state(phone_number: &str, state_json: &str) -> ConvState {
    serde_json::from_str(state_json).unwrap_or_else(|e| {
        tracing::warn!(phone = %phone_number, error = %e, "Unreadable conversation state, resetting");
        ConvState::default()
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
