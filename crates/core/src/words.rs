//! Spanish amount-in-words for the legal footer of the quotation document:
//! `"Mil Doscientos Treinta y Cuatro Con 56/100 Soles Peruanos"`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const UNITS: [&str; 10] =
    ["", "Uno", "Dos", "Tres", "Cuatro", "Cinco", "Seis", "Siete", "Ocho", "Nueve"];
const TEENS: [&str; 10] = [
    "Diez",
    "Once",
    "Doce",
    "Trece",
    "Catorce",
    "Quince",
    "Dieciséis",
    "Diecisiete",
    "Dieciocho",
    "Diecinueve",
];
const TENS: [&str; 10] = [
    "", "Diez", "Veinte", "Treinta", "Cuarenta", "Cincuenta", "Sesenta", "Setenta", "Ochenta",
    "Noventa",
];
const HUNDREDS: [&str; 10] = [
    "",
    "Ciento",
    "Doscientos",
    "Trescientos",
    "Cuatrocientos",
    "Quinientos",
    "Seiscientos",
    "Setecientos",
    "Ochocientos",
    "Novecientos",
];

// Largest value the millions/thousands/hundreds clauses can spell out.
const MAX_EXPRESSIBLE: u64 = 999_999_999_999;

/// Convert an amount to its Spanish commercial-document form.
///
/// Cents round to two decimals and the clause `Con {cc}/100` is omitted when
/// they are zero. Amounts are expected to be non-negative; the sign is
/// ignored.
pub fn amount_to_words(amount: Decimal) -> String {
    let rounded = amount.abs().round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let integer = rounded.trunc();
    let cents = ((rounded - integer) * Decimal::from(100)).to_u32().unwrap_or(0);
    let integer = integer.to_u64().unwrap_or(0).min(MAX_EXPRESSIBLE);

    let mut result = integer_to_words(integer);
    if cents > 0 {
        result.push_str(&format!(" Con {cents:02}/100"));
    }
    result.push_str(" Soles Peruanos");
    result
}

fn integer_to_words(value: u64) -> String {
    if value == 0 {
        return "Cero".to_string();
    }

    let millions = value / 1_000_000;
    let rest = value % 1_000_000;

    let mut result = match millions {
        0 => String::new(),
        // Singular-irregular: never "Uno Millón".
        1 => "Un Millón".to_string(),
        _ => format!("{} Millones", convert_thousands(millions)),
    };

    if rest > 0 {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&convert_thousands(rest));
    }

    result
}

fn convert_thousands(value: u64) -> String {
    if value == 0 {
        return String::new();
    }
    if value == 1000 {
        // "Mil", never "Un Mil".
        return "Mil".to_string();
    }

    let thousands = value / 1000;
    let rest = (value % 1000) as u32;

    let mut result = match thousands {
        0 => String::new(),
        1 => "Mil".to_string(),
        _ => format!("{} Mil", convert_hundreds(thousands as u32)),
    };

    if rest > 0 {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&convert_hundreds(rest));
    }

    result
}

fn convert_hundreds(value: u32) -> String {
    if value == 0 {
        return String::new();
    }
    if value == 100 {
        // Exact hundred is "Cien"; 101..=199 fall through to "Ciento {rest}".
        return "Cien".to_string();
    }

    let hundreds = value / 100;
    let rest = value % 100;

    let mut result = HUNDREDS[hundreds as usize].to_string();
    if rest > 0 {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&convert_tens(rest));
    }

    result
}

fn convert_tens(value: u32) -> String {
    if value == 0 {
        return String::new();
    }
    if value < 10 {
        return UNITS[value as usize].to_string();
    }
    if value < 20 {
        return TEENS[(value - 10) as usize].to_string();
    }

    let tens = value / 10;
    let unit = value % 10;

    if unit == 0 {
        return TENS[tens as usize].to_string();
    }
    if tens == 2 {
        // Contracted form without a space: Veintiuno, Veintidos, ...
        return format!("Veinti{}", UNITS[unit as usize].to_lowercase());
    }
    format!("{} y {}", TENS[tens as usize], UNITS[unit as usize])
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::amount_to_words;

    fn words(value: &str) -> String {
        amount_to_words(value.parse::<Decimal>().expect("test literal"))
    }

    #[test]
    fn integer_table() {
        let cases: &[(&str, &str)] = &[
            ("0", "Cero Soles Peruanos"),
            ("1", "Uno Soles Peruanos"),
            ("9", "Nueve Soles Peruanos"),
            ("10", "Diez Soles Peruanos"),
            ("15", "Quince Soles Peruanos"),
            ("16", "Dieciséis Soles Peruanos"),
            ("19", "Diecinueve Soles Peruanos"),
            ("20", "Veinte Soles Peruanos"),
            ("21", "Veintiuno Soles Peruanos"),
            ("29", "Veintinueve Soles Peruanos"),
            ("30", "Treinta Soles Peruanos"),
            ("35", "Treinta y Cinco Soles Peruanos"),
            ("99", "Noventa y Nueve Soles Peruanos"),
            ("100", "Cien Soles Peruanos"),
            ("101", "Ciento Uno Soles Peruanos"),
            ("116", "Ciento Dieciséis Soles Peruanos"),
            ("199", "Ciento Noventa y Nueve Soles Peruanos"),
            ("200", "Doscientos Soles Peruanos"),
            ("555", "Quinientos Cincuenta y Cinco Soles Peruanos"),
            ("999", "Novecientos Noventa y Nueve Soles Peruanos"),
            ("1000", "Mil Soles Peruanos"),
            ("1001", "Mil Uno Soles Peruanos"),
            ("1100", "Mil Cien Soles Peruanos"),
            ("1234", "Mil Doscientos Treinta y Cuatro Soles Peruanos"),
            ("2000", "Dos Mil Soles Peruanos"),
            ("21000", "Veintiuno Mil Soles Peruanos"),
            ("100000", "Cien Mil Soles Peruanos"),
            ("999999", "Novecientos Noventa y Nueve Mil Novecientos Noventa y Nueve Soles Peruanos"),
            ("1000000", "Un Millón Soles Peruanos"),
            ("1000001", "Un Millón Uno Soles Peruanos"),
            ("2000000", "Dos Millones Soles Peruanos"),
            ("2500000", "Dos Millones Quinientos Mil Soles Peruanos"),
        ];

        for (input, expected) in cases {
            assert_eq!(words(input), *expected, "input {input}");
        }
    }

    #[test]
    fn cents_clause_appended_when_nonzero() {
        assert_eq!(
            words("1234.56"),
            "Mil Doscientos Treinta y Cuatro Con 56/100 Soles Peruanos"
        );
        assert_eq!(words("0.05"), "Cero Con 05/100 Soles Peruanos");
    }

    #[test]
    fn cents_clause_omitted_when_zero() {
        assert_eq!(words("1234.00"), "Mil Doscientos Treinta y Cuatro Soles Peruanos");
    }

    #[test]
    fn cents_round_to_two_decimals() {
        assert_eq!(words("1.005"), "Uno Con 01/100 Soles Peruanos");
        assert_eq!(words("1.004"), "Uno Soles Peruanos");
    }

    #[test]
    fn hundred_is_cien_only_when_exact() {
        assert!(words("100").starts_with("Cien "));
        assert!(words("101").starts_with("Ciento Uno"));
        assert!(words("100.50").starts_with("Cien Con"));
    }

    #[test]
    fn one_thousand_is_mil_not_un_mil() {
        assert!(!words("1000").contains("Un Mil"));
        assert!(words("1000").starts_with("Mil "));
    }
}
