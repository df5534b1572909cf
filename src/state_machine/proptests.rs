//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::event::Command;
use super::state::*;
use super::transition::*;
use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const PHONE: &str = "whatsapp:+5511900000000";

fn test_context(menu: Vec<MenuItem>) -> ConvContext {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ConvContext::new(PHONE, menu, now)
}

fn reply_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Reply { .. }))
        .count()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_menu_item() -> impl Strategy<Value = MenuItem> {
    (
        "[a-z]{1,6}",
        "[A-Z][a-z]{2,8}",
        0u32..10_000,
        prop_oneof![Just("Lanches"), Just("Bebidas"), Just("Sobremesas")],
    )
        .prop_map(|(id, name, cents, category)| {
            MenuItem::new(id, name, "descrição", f64::from(cents) / 100.0, category)
        })
}

fn arb_menu() -> impl Strategy<Value = Vec<MenuItem>> {
    proptest::collection::vec(arb_menu_item(), 1..6).prop_map(|mut items| {
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items.dedup_by(|a, b| a.id == b.id);
        items
    })
}

fn arb_message() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("cardapio".to_string()),
        Just("carrinho".to_string()),
        Just("limpar".to_string()),
        Just("confirmar".to_string()),
        ("[a-z]{1,6}", 0u32..5).prop_map(|(id, q)| format!("adicionar {id} {q}")),
        "[a-zA-Z0-9 ]{0,20}",
    ]
}

fn arb_cart(menu: Vec<MenuItem>) -> impl Strategy<Value = Cart> {
    let len = menu.len();
    proptest::collection::vec((0..len, 1u32..20), 0..5).prop_map(move |adds| {
        let mut cart = Cart::new();
        for (index, quantity) in adds {
            cart.add(&menu[index], quantity);
        }
        cart
    })
}

fn arb_state_and_menu() -> impl Strategy<Value = (ConvState, Vec<MenuItem>)> {
    arb_menu().prop_flat_map(|menu| {
        let carts = arb_cart(menu.clone());
        (
            prop_oneof![
                Just(0u8),
                Just(1u8),
                Just(2u8),
            ],
            carts,
            Just(menu),
        )
            .prop_map(|(kind, cart, menu)| {
                let state = match kind {
                    0 => ConvState::Initial,
                    1 => ConvState::Ordering { cart },
                    _ => ConvState::GettingAddress { cart },
                };
                (state, menu)
            })
    })
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &ConvState) -> bool {
    match state.cart() {
        None => true,
        Some(cart) => {
            let mut ids: Vec<_> = cart.items().iter().map(|l| &l.item_id).collect();
            let len = ids.len();
            ids.sort();
            ids.dedup();
            ids.len() == len && cart.items().iter().all(|l| l.quantity > 0)
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: carts stay well-formed across any message sequence
    #[test]
    fn prop_transitions_preserve_validity(
        menu in arb_menu(),
        messages in proptest::collection::vec(arb_message(), 0..25)
    ) {
        let ctx = test_context(menu);
        let mut state = ConvState::Initial;

        for text in messages {
            let result = transition(&state, &ctx, Event::user_message(text));
            prop_assert!(result.is_ok(), "User messages never fail: {:?}", result);
            state = result.unwrap().new_state;
            prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
        }
    }

    // Invariant 2: every customer message is persisted first
    #[test]
    fn prop_user_messages_persist_first(
        (state, menu) in arb_state_and_menu(),
        text in arb_message()
    ) {
        let result = transition(&state, &test_context(menu), Event::user_message(text)).unwrap();
        prop_assert_eq!(result.effects.first(), Some(&Effect::PersistState));
    }

    // Invariant 3: at most one reply per message, and a reply unless checking out
    #[test]
    fn prop_single_reply(
        (state, menu) in arb_state_and_menu(),
        text in arb_message()
    ) {
        let result = transition(&state, &test_context(menu), Event::user_message(text)).unwrap();
        let creates = result.effects.iter().any(|e| matches!(e, Effect::CreateOrder { .. }));
        let replies = reply_count(&result.effects);
        prop_assert_eq!(replies, usize::from(!creates));
    }

    // Invariant 4: repeated adds sum quantities and keep the first price
    #[test]
    fn prop_repeated_adds_sum(
        menu in arb_menu(),
        quantities in proptest::collection::vec(1u32..50, 1..10),
        new_price in 0u32..10_000
    ) {
        let item = menu[0].clone();
        let mut ctx = test_context(menu);
        let mut state = ConvState::Ordering { cart: Cart::new() };

        for (i, q) in quantities.iter().enumerate() {
            state = transition(&state, &ctx, Event::user_message(format!("adicionar {} {q}", item.id)))
                .unwrap()
                .new_state;
            if i == 0 {
                // Reprice the catalog after the first add
                ctx.menu[0].price = f64::from(new_price) / 100.0;
                ctx.menu[0].name = "Outro Nome".to_string();
            }
        }

        let line = state.cart().unwrap().get(&item.id).unwrap().clone();
        prop_assert_eq!(line.quantity, quantities.iter().sum::<u32>());
        prop_assert!(approx_eq(line.unit_price, item.price));
        prop_assert_eq!(line.name, item.name);
    }

    // Invariant 5: limpar always empties the cart
    #[test]
    fn prop_clear_always_empties((state, menu) in arb_state_and_menu()) {
        let ConvState::Ordering { .. } = state else { return Ok(()); };
        let result = transition(&state, &test_context(menu), Event::user_message("limpar")).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Ordering { cart: Cart::new() });
    }

    // Invariant 6: confirmar only advances with a non-empty cart
    #[test]
    fn prop_confirm_requires_items((state, menu) in arb_state_and_menu()) {
        let ConvState::Ordering { cart } = &state else { return Ok(()); };
        let result = transition(&state, &test_context(menu), Event::user_message("confirmar")).unwrap();
        if cart.is_empty() {
            prop_assert_eq!(&result.new_state, &state);
        } else {
            prop_assert_eq!(result.new_state, ConvState::GettingAddress { cart: cart.clone() });
        }
    }

    // Invariant 7: the address predicate is exactly trimmed length >= 10
    #[test]
    fn prop_address_predicate(
        menu in arb_menu(),
        address in "[a-zA-Z0-9 ]{0,20}",
        padding in " {0,3}"
    ) {
        let mut cart = Cart::new();
        cart.add(&menu[0], 1);
        let state = ConvState::GettingAddress { cart };
        let text = format!("{padding}{address}{padding}");

        let result = transition(&state, &test_context(menu), Event::user_message(text)).unwrap();
        let accepted = result.effects.iter().any(|e| matches!(e, Effect::CreateOrder { .. }));
        prop_assert_eq!(accepted, address.trim().chars().count() >= MIN_ADDRESS_LEN);
        prop_assert_eq!(result.new_state, state);
    }

    // Invariant 8: order total is the cart snapshot total
    #[test]
    fn prop_order_total_matches_cart(
        (state, menu) in arb_state_and_menu()
    ) {
        let ConvState::GettingAddress { cart } = &state else { return Ok(()); };
        if cart.is_empty() {
            return Ok(());
        }
        let expected: f64 = cart
            .items()
            .iter()
            .map(|l| f64::from(l.quantity) * l.unit_price)
            .sum();

        let result = transition(&state, &test_context(menu), Event::user_message("Rua das Flores 100")).unwrap();
        let order = result.effects.iter().find_map(|e| match e {
            Effect::CreateOrder { order } => Some(order.clone()),
            _ => None,
        });
        let order = order.unwrap();
        prop_assert!(approx_eq(order.total_price, expected));
        prop_assert_eq!(order.items.len(), cart.len());
    }

    // Invariant 9: placing an order always lands in a fresh Initial state
    #[test]
    fn prop_order_placed_resets(
        (state, menu) in arb_state_and_menu(),
        kitchen in proptest::option::of("whatsapp:\\+55[0-9]{8}")
    ) {
        let ConvState::GettingAddress { cart } = &state else { return Ok(()); };
        let ctx = test_context(menu).with_kitchen_number(kitchen.clone());
        let mut order = Order::checkout(PHONE, cart, "Rua das Flores 100", ctx.now);
        order.order_id = Some("ord".to_string());

        let result = transition(&state, &ctx, Event::OrderPlaced { order }).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Initial);
        prop_assert_eq!(result.effects.last(), Some(&Effect::ClearConversation));
        let notified = result.effects.iter().any(|e| matches!(e, Effect::NotifyKitchen { .. }));
        prop_assert_eq!(notified, kitchen.is_some());
    }

    // Invariant 10: parsing never panics and is case-insensitive
    #[test]
    fn prop_parse_case_insensitive(text in "[a-zA-Z0-9 ]{0,30}") {
        prop_assert_eq!(Command::parse(&text), Command::parse(&text.to_uppercase()));
    }
}
