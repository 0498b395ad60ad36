use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use rust_decimal::{Decimal, RoundingStrategy};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned cell for a number.
pub fn value_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| value_cell(format_fn(v)),
    )
}

/// Formats a cell with bold and green text
pub fn format_percentage_cell(value: Decimal) -> Cell {
    Cell::new(format_percent(value))
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for a savings amount: green when the advisory model is cheaper.
pub fn savings_cell(text: String, savings: Decimal) -> Cell {
    let color = if savings >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(text)
        .fg(color)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Right)
}

/// Formats a percentage with two decimals.
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", round_cents(value))
}

/// Formats money for display. BRL uses the Brazilian convention (`R$ 1.234,56`).
pub fn format_money(value: Decimal, currency: &str) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    if currency.eq_ignore_ascii_case("BRL") {
        format!("{sign}R$ {},{fraction}", group_thousands(integer, '.'))
    } else {
        format!("{sign}{}.{fraction} {currency}", group_thousands(integer, ','))
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Creates a dimmed "N/A" cell for values that do not apply.
pub fn na_cell() -> Cell {
    Cell::new("N/A")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money_brl() {
        assert_eq!(format_money(dec!(1234.5), "BRL"), "R$ 1.234,50");
        assert_eq!(format_money(dec!(2000000), "BRL"), "R$ 2.000.000,00");
        assert_eq!(format_money(dec!(799), "BRL"), "R$ 799,00");
        assert_eq!(format_money(dec!(-549), "BRL"), "-R$ 549,00");
        assert_eq!(format_money(dec!(0.005), "BRL"), "R$ 0,01");
    }

    #[test]
    fn test_format_money_other_currency() {
        assert_eq!(format_money(dec!(1234567.891), "USD"), "1,234,567.89 USD");
        assert_eq!(format_money(dec!(12), "EUR"), "12.00 EUR");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(33.3333)), "33.33%");
        assert_eq!(format_percent(dec!(50)), "50.00%");
    }
}
