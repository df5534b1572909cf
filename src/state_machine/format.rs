//! Customer-facing and kitchen-facing message templates

use super::state::{Cart, MenuItem, Order};

pub const WELCOME: &str = "Olá! 👋 Bem-vindo(a) ao nosso atendimento automático. \
     Para ver o cardápio, digite `cardapio`.";

pub const MENU_UNAVAILABLE: &str =
    "Desculpe, nosso cardápio não está disponível no momento. Tente novamente mais tarde.";

pub const EMPTY_CART: &str = "Seu carrinho está vazio.";

pub const CART_CLEARED: &str = "Seu carrinho foi esvaziado.";

pub const CONFIRM_EMPTY_CART: &str = "Seu carrinho está vazio. Adicione itens antes de confirmar.";

pub const ASK_ADDRESS: &str = "Por favor, digite seu endereço completo para a entrega.";

pub const ADDRESS_TOO_SHORT: &str = "Por favor, forneça um endereço mais detalhado.";

pub const ADD_USAGE: &str = "❌ Comando inválido. Use: `adicionar <id_do_item> <quantidade>`. \
     Ex: `adicionar burguer-artesanal 2`";

pub const ORDERING_HELP: &str =
    "Comando não reconhecido. Use `adicionar`, `carrinho`, `limpar` ou `confirmar`.";

/// Channel prefix stripped from phone numbers shown to the kitchen
const CHANNEL_PREFIX: &str = "whatsapp:";

pub fn money(amount: f64) -> String {
    format!("R$ {amount:.2}")
}

/// Menu grouped by category, categories in first-seen order
pub fn format_menu(menu: &[MenuItem]) -> String {
    let mut categories: Vec<(&str, Vec<&MenuItem>)> = Vec::new();
    for item in menu {
        match categories.iter_mut().find(|(name, _)| *name == item.category) {
            Some((_, items)) => items.push(item),
            None => categories.push((item.category.as_str(), vec![item])),
        }
    }

    let sections: String = categories
        .iter()
        .map(|(category, items)| {
            let lines: String = items
                .iter()
                .map(|item| {
                    format!(
                        "  - `{}`: {} - {}\n    _{}_\n",
                        item.id,
                        item.name,
                        money(item.price),
                        item.description
                    )
                })
                .collect();
            format!("*{category}*\n{lines}\n")
        })
        .collect();

    format!(
        "Nosso cardápio de hoje:\n\n{sections}\
         Para adicionar um item, digite `adicionar <id_do_item> <quantidade>`.\n\
         Exemplo: `adicionar burguer-artesanal 2`"
    )
}

pub fn format_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return EMPTY_CART.to_string();
    }

    let lines: String = cart
        .items()
        .iter()
        .map(|line| {
            format!(
                "- {}x {}: {}\n",
                line.quantity,
                line.name,
                money(line.line_total())
            )
        })
        .collect();

    format!(
        "🛒 *Seu Carrinho:*\n{lines}\n*Total: {}*\n\n\
         Digite `confirmar` para finalizar o pedido, `limpar` para esvaziar o carrinho \
         ou continue adicionando itens.",
        money(cart.total())
    )
}

pub fn format_item_added(quantity: u32, name: &str, cart: &Cart) -> String {
    format!(
        "✅ {quantity}x {name} adicionado(s) ao seu carrinho!\n\n{}",
        format_cart(cart)
    )
}

pub fn format_item_not_found(item_id: &str) -> String {
    format!("❌ Desculpe, o item com ID `{item_id}` não foi encontrado no cardápio.")
}

pub fn format_order_confirmation(order: &Order) -> String {
    format!(
        "✅ Pedido confirmado com sucesso!\n\n\
         O seu pedido nº `{}` já está sendo preparado e logo sairá para entrega no endereço:\n\
         _{}_\n\n\
         Valor total: *{}*\n\n\
         Obrigado pela sua preferência!",
        order.display_id(),
        order.address,
        money(order.total_price)
    )
}

/// Operations summary: no unit prices, channel prefix stripped from the phone
pub fn format_order_for_kitchen(order: &Order) -> String {
    let customer = order
        .customer_phone
        .strip_prefix(CHANNEL_PREFIX)
        .unwrap_or(&order.customer_phone);

    let items: String = order
        .items
        .iter()
        .map(|item| format!("- {}x {}\n", item.quantity, item.name))
        .collect();

    format!(
        "🔔 *Novo Pedido Recebido!* 🔔\n\n\
         *ID do Pedido:* `{}`\n\
         *Cliente:* {customer}\n\
         *Endereço:* {}\n\n\
         *Itens:*\n{items}\n\
         *Total do Pedido: {}*",
        order.display_id(),
        order.address,
        money(order.total_price)
    )
}
