use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Income, expense and the balance between them for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

impl PeriodSummary {
    pub fn new(income: Decimal, expense: Decimal) -> Self {
        Self {
            income,
            expense,
            balance: accumulate(income, -expense),
        }
    }
}

/// Adds `amount` to a running total, saturating at the bounds of `Decimal`
/// instead of panicking.
pub fn accumulate(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!("Total overflowed adding {} to {}, saturating", amount, total);
        if amount.is_sign_negative() { Decimal::MIN } else { Decimal::MAX }
    })
}

/// One bar of the yearly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub month: u32,
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub expense: Decimal,
}
