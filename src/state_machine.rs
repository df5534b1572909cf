//! Core ordering conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod format;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{Cart, ConvContext, ConvState, MenuItem, Order, OrderItem, OrderStatus};
pub use transition::transition;
