//! Pure state transition function
//!
//! Given the current state, the turn context and an event, computes the next
//! state and the effects the runtime must carry out. No I/O happens here.

use super::event::{Command, CommandError};
use super::format;
use super::state::{find_item, Cart, ConvContext, ConvState, Order};
use super::{Effect, Event};
use thiserror::Error;

/// Minimum trimmed length, in characters, of an acceptable delivery address
pub const MIN_ADDRESS_LEN: usize = 10;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Persist the new state, then reply to the customer
    fn persist_and_reply(state: ConvState, body: impl Into<String>) -> Self {
        Self::new(state)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::reply(body))
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Customer messages
        // ============================================================
        (ConvState::Initial, Event::UserMessage { text }) => {
            Ok(handle_initial(context, &Command::parse(&text)))
        }

        (ConvState::Ordering { cart }, Event::UserMessage { text }) => {
            Ok(handle_ordering(cart, context, Command::parse(&text)))
        }

        (ConvState::GettingAddress { cart }, Event::UserMessage { text }) => {
            Ok(handle_address(cart, context, &text))
        }

        // Nothing leads here; a stored record in this state is left untouched
        (ConvState::ConfirmingOrder { .. }, Event::UserMessage { .. }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::PersistState))
        }

        // ============================================================
        // Order persisted
        // ============================================================
        (ConvState::GettingAddress { .. }, Event::OrderPlaced { order }) => {
            let mut effects = vec![Effect::reply(format::format_order_confirmation(&order))];
            if let Some(kitchen) = &context.kitchen_number {
                effects.push(Effect::NotifyKitchen {
                    to: kitchen.clone(),
                    body: format::format_order_for_kitchen(&order),
                });
            }
            effects.push(Effect::ClearConversation);
            Ok(TransitionResult::new(ConvState::Initial).with_effects(effects))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {:?}",
            state.name(),
            event
        ))),
    }
}

fn handle_initial(context: &ConvContext, command: &Command) -> TransitionResult {
    match command {
        Command::Menu if context.menu.is_empty() => {
            TransitionResult::persist_and_reply(ConvState::Initial, format::MENU_UNAVAILABLE)
        }
        Command::Menu => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: Cart::new() },
            format::format_menu(&context.menu),
        ),
        _ => TransitionResult::persist_and_reply(ConvState::Initial, format::WELCOME),
    }
}

fn handle_ordering(cart: &Cart, context: &ConvContext, command: Command) -> TransitionResult {
    match command {
        Command::Add { item_id, quantity } => match find_item(&context.menu, &item_id) {
            Some(item) => {
                let mut cart = cart.clone();
                cart.add(item, quantity);
                let body = format::format_item_added(quantity, &item.name, &cart);
                TransitionResult::persist_and_reply(ConvState::Ordering { cart }, body)
            }
            None => TransitionResult::persist_and_reply(
                ConvState::Ordering { cart: cart.clone() },
                format::format_item_not_found(&item_id),
            ),
        },

        Command::Invalid(CommandError::AddUsage) => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: cart.clone() },
            format::ADD_USAGE,
        ),

        Command::Cart => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: cart.clone() },
            format::format_cart(cart),
        ),

        Command::Clear => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: Cart::new() },
            format::CART_CLEARED,
        ),

        Command::Confirm if cart.is_empty() => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: cart.clone() },
            format::CONFIRM_EMPTY_CART,
        ),

        Command::Confirm => TransitionResult::persist_and_reply(
            ConvState::GettingAddress { cart: cart.clone() },
            format::ASK_ADDRESS,
        ),

        Command::Menu => {
            let body = if context.menu.is_empty() {
                format::MENU_UNAVAILABLE.to_string()
            } else {
                format::format_menu(&context.menu)
            };
            TransitionResult::persist_and_reply(ConvState::Ordering { cart: cart.clone() }, body)
        }

        Command::Unknown => TransitionResult::persist_and_reply(
            ConvState::Ordering { cart: cart.clone() },
            format::ORDERING_HELP,
        ),
    }
}

fn handle_address(cart: &Cart, context: &ConvContext, text: &str) -> TransitionResult {
    let address = text.trim();
    let state = ConvState::GettingAddress { cart: cart.clone() };

    if address.chars().count() < MIN_ADDRESS_LEN {
        return TransitionResult::persist_and_reply(state, format::ADDRESS_TOO_SHORT);
    }

    let order = Order::checkout(&context.phone_number, cart, address, context.now);
    TransitionResult::new(state)
        .with_effect(Effect::PersistState)
        .with_effect(Effect::CreateOrder { order })
}
