//! Currency rendering (es-PE grouping, always two decimals) and the lenient
//! numeric parsing applied to advisor-typed amounts.

use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY_SYMBOL: &str = "S/";

/// `1234.5` → `"S/ 1,234.50"`.
pub fn format_currency(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL} {}", format_amount(amount))
}

/// The numeric part only: two fraction digits, comma thousands grouping.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let text = rounded.abs().to_string();
    let (integer_part, fraction_part) = match text.split_once('.') {
        Some((integer_part, fraction_part)) => (integer_part, fraction_part),
        None => (text.as_str(), ""),
    };

    let mut fraction = fraction_part.to_string();
    fraction.truncate(2);
    while fraction.len() < 2 {
        fraction.push('0');
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{}.{fraction}", group_thousands(integer_part))
}

/// Parse an advisor-typed amount, coercing anything unparseable to zero.
///
/// This is the explicit form of the source UI's `parseFloat(value) || 0`
/// policy: currency symbol and grouping commas are tolerated, everything
/// else collapses to zero instead of raising.
pub fn parse_money(input: &str) -> Decimal {
    let cleaned: String = input
        .trim()
        .trim_start_matches(CURRENCY_SYMBOL)
        .trim()
        .chars()
        .filter(|ch| *ch != ',')
        .collect();

    cleaned.parse().unwrap_or(Decimal::ZERO)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
