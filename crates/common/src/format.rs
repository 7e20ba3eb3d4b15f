//! Display formatting shared by every page.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Formats `amount` vi-VN style: `.` groups thousands, `,` marks decimals,
/// the currency symbol trails. At most two decimals are shown.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    format!("{}{}", format_amount(amount), symbol)
}

pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut body = group_digits(int_part, '.');
    if let Some(frac) = frac_part {
        body.push(',');
        body.push_str(frac);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", body)
    } else {
        body
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Plain decimal for form inputs.
pub fn input_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Short day label for list rows, e.g. "2 Mar".
pub fn day_label(day: NaiveDate) -> String {
    day.format("%-d %b").to_string()
}

/// Serializes chart data for embedding inside a `<script>` element.
pub fn script_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace('<', "\\u003c"),
        Err(e) => {
            tracing::error!("Failed to serialize chart data: {}", e);
            "null".to_string()
        }
    }
}
