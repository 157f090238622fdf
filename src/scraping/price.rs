//! Brazilian-locale price parsing, discount derivation and display formatting.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::types::DiscountPct;

/// Prices at or above this value are treated as parsing noise.
pub const MAX_PLAUSIBLE_PRICE: u32 = 1_000_000;

/// Parse a `pt-BR` formatted amount such as `"R$ 1.234,56"`.
///
/// Scanning starts at the first digit. A `.` is a thousands separator only
/// when exactly three digits follow it; `,` starts the decimal part; any
/// other character ends the number. A dot-decimal value like `"1234.56"`
/// therefore parses as `1234`.
pub fn parse_brl(text: &str) -> Option<Decimal> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().position(char::is_ascii_digit)?;

    let mut integer = String::new();
    let mut fraction = String::new();
    let mut in_fraction = false;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '0'..='9' if in_fraction => fraction.push(c),
            '0'..='9' => integer.push(c),
            '.' if !in_fraction && is_thousands_group(&chars, i) => {}
            ',' if !in_fraction && chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                in_fraction = true;
            }
            _ => break,
        }
        i += 1;
    }

    let literal = if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    };
    Decimal::from_str(&literal).ok()
}

/// `.` at `idx` followed by exactly three digits.
fn is_thousands_group(chars: &[char], idx: usize) -> bool {
    let group = chars.get(idx + 1..idx + 4);
    let digits = group.is_some_and(|g| g.iter().all(char::is_ascii_digit));
    digits && !chars.get(idx + 4).is_some_and(char::is_ascii_digit)
}

/// Parse a dot-decimal number as found in JSON (`"1299.9"`, `89`).
pub fn parse_json_number(text: &str) -> Option<Decimal> {
    let text = text.trim().trim_matches('"');
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Whether a parsed candidate lies in `0.01 <= price < 1,000,000`.
///
/// Sub-cent amounts are rejected since prices are stored as whole cents.
pub fn is_plausible(price: Decimal) -> bool {
    price >= Decimal::new(1, 2) && price < Decimal::from(MAX_PLAUSIBLE_PRICE)
}

/// Rounded percentage discount from `previous` down to `current`.
///
/// Defined only when `previous > current > 0`.
pub fn discount_pct(previous: Decimal, current: Decimal) -> Option<DiscountPct> {
    if current <= Decimal::ZERO || previous <= current {
        return None;
    }
    let pct = ((previous - current) / previous * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()?;
    DiscountPct::new(pct).ok()
}

/// Format a value as Brazilian reais: `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (integer, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{cents}")
}
