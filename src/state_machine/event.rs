//! Events that can occur in a conversation

use crate::state_machine::state::Order;
use thiserror::Error;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Inbound text from the customer
    UserMessage { text: String },

    /// Persistence stored the order produced by `Effect::CreateOrder`
    OrderPlaced { order: Order },
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}

/// Malformed command payloads, answered with a usage message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: adicionar <id_do_item> <quantidade>")]
    AddUsage,
}

/// A parsed customer command.
///
/// The text is lowercased and trimmed; the first whitespace-separated token
/// selects the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `cardapio`
    Menu,
    /// `adicionar <id> <qty>` with a positive integer quantity
    Add { item_id: String, quantity: u32 },
    /// `carrinho`
    Cart,
    /// `limpar`
    Clear,
    /// `confirmar`
    Confirm,
    /// A known command with a bad payload
    Invalid(CommandError),
    /// Anything else, including empty text
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        let parts: Vec<&str> = normalized.split_whitespace().collect();

        match parts.as_slice() {
            ["cardapio", ..] => Command::Menu,
            ["carrinho", ..] => Command::Cart,
            ["limpar", ..] => Command::Clear,
            ["confirmar", ..] => Command::Confirm,
            ["adicionar", item_id, quantity] => match parse_quantity(quantity) {
                Some(quantity) => Command::Add {
                    item_id: (*item_id).to_string(),
                    quantity,
                },
                None => Command::Invalid(CommandError::AddUsage),
            },
            ["adicionar", ..] => Command::Invalid(CommandError::AddUsage),
            _ => Command::Unknown,
        }
    }
}

/// Strictly positive integer; anything else is rejected
fn parse_quantity(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|q| *q > 0)
}
