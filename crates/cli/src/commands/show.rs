//! Cart rendering for the terminal.

use rocketcart_core::{CurrencyCode, LineItem};

/// Render the cart as a plain-text table.
pub fn render_cart(lines: &[LineItem]) -> String {
    if lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for line in lines {
        let price = line.attributes.price_in(CurrencyCode::default()).display();
        out.push_str(&format!(
            "{:>6}  {:<40} {:>4} x {}\n",
            line.id.as_i32(),
            line.attributes.title,
            line.quantity.get(),
            price
        ));
    }

    let units: u64 = lines.iter().map(|l| u64::from(l.quantity.get())).sum();
    out.push_str(&format!("{} line(s), {units} unit(s)", lines.len()));
    out
}

/// Print the cart to stdout.
#[allow(clippy::print_stdout)]
pub fn print_cart(lines: &[LineItem]) {
    println!("{}", render_cart(lines));
}
