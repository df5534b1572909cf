//! Conversation state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog
// ============================================================================

/// A catalog entry. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Stable identifier, typed by customers in `adicionar <id> <qty>`
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Grouping label used when rendering the menu
    pub category: String,
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
        }
    }
}

/// Look up a catalog entry by id; commands arrive lowercased
pub fn find_item<'a>(menu: &'a [MenuItem], item_id: &str) -> Option<&'a MenuItem> {
    menu.iter().find(|item| item.id.to_lowercase() == item_id)
}

// ============================================================================
// Cart
// ============================================================================

/// A line in a cart or order.
///
/// `name` and `unit_price` are snapshots taken when the item was first added,
/// so catalog price changes never touch an in-progress cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// Items keyed by `item_id`, kept in insertion order.
///
/// Serialized as a plain list; keys are unique and every quantity is > 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<OrderItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn get(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    /// Add `quantity` units of a catalog item.
    ///
    /// An existing line only has its quantity increased; a new line snapshots
    /// the catalog name and price. A zero quantity is ignored.
    pub fn add(&mut self, item: &MenuItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|line| line.item_id == item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.items.push(OrderItem {
                item_id: item.id.clone(),
                name: item.name.clone(),
                quantity,
                unit_price: item.price,
            });
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Conversation state
///
/// The cart lives inside the variants that can hold one, so `Initial` is
/// always cart-less.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// First contact, or the reset target after an order is placed
    #[default]
    Initial,

    /// Browsing the menu and building the cart
    Ordering { cart: Cart },

    /// Double-confirmation step; nothing transitions into it
    #[allow(dead_code)] // Reserved for a confirmation step before asking the address
    ConfirmingOrder { cart: Cart },

    /// Cart confirmed, waiting for the delivery address
    GettingAddress { cart: Cart },
}

impl ConvState {
    /// The cart held by this state, if any
    pub fn cart(&self) -> Option<&Cart> {
        match self {
            ConvState::Initial => None,
            ConvState::Ordering { cart }
            | ConvState::ConfirmingOrder { cart }
            | ConvState::GettingAddress { cart } => Some(cart),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Initial => "initial",
            ConvState::Ordering { .. } => "ordering",
            ConvState::ConfirmingOrder { .. } => "confirming_order",
            ConvState::GettingAddress { .. } => "getting_address",
        }
    }
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => OrderStatus::Confirmed,
            _ => OrderStatus::Pending,
        }
    }
}

/// A finalized order. Never mutated by the engine once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by persistence; `None` until the order is stored
    pub order_id: Option<String>,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Assemble an order from a cart snapshot.
    ///
    /// The total comes from the snapshotted unit prices, never the live catalog.
    pub fn checkout(
        customer_phone: impl Into<String>,
        cart: &Cart,
        address: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: None,
            customer_phone: customer_phone.into(),
            items: cart.items().to_vec(),
            total_price: cart.total(),
            status: OrderStatus::Confirmed,
            address: address.into(),
            created_at,
        }
    }

    /// Order id for display; placeholder while unassigned
    pub fn display_id(&self) -> &str {
        self.order_id.as_deref().unwrap_or("?")
    }
}

// ============================================================================
// Context
// ============================================================================

/// Everything the engine may read during one turn besides the state itself
#[derive(Debug, Clone)]
pub struct ConvContext {
    /// Identity of the customer (e.g. `whatsapp:+5511...`)
    pub phone_number: String,
    /// Catalog snapshot for this turn; empty when unavailable
    pub menu: Vec<MenuItem>,
    /// Operations channel for new-order notifications
    pub kitchen_number: Option<String>,
    /// Turn timestamp, used for order creation
    pub now: DateTime<Utc>,
}

impl ConvContext {
    pub fn new(phone_number: impl Into<String>, menu: Vec<MenuItem>, now: DateTime<Utc>) -> Self {
        Self {
            phone_number: phone_number.into(),
            menu,
            kitchen_number: None,
            now,
        }
    }

    pub fn with_kitchen_number(mut self, kitchen_number: Option<String>) -> Self {
        self.kitchen_number = kitchen_number;
        self
    }
}
