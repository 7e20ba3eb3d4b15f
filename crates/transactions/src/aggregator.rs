//! Totals and groupings derived from a period's transactions.
//!
//! Everything here is pure: the inputs are whatever the sheet returned for a
//! month and the outputs feed the pages directly. Types other than income and
//! expense count towards neither total.

use crate::models::Transaction;
use chrono::NaiveDate;
use common::models::{accumulate, PeriodSummary};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Category label -> summed expense amount.
pub type CategorySummary = BTreeMap<String, Decimal>;

/// Transactions recorded under the same date string.
#[derive(Debug, PartialEq)]
pub struct DayGroup<'a> {
    pub date: &'a str,
    pub day: NaiveDate,
    pub transactions: Vec<&'a Transaction>,
}

pub fn summarize(transactions: &[Transaction]) -> PeriodSummary {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    for t in transactions {
        if t.is_income() {
            income = accumulate(income, t.amount);
        } else if t.is_expense() {
            expense = accumulate(expense, t.amount);
        }
    }

    PeriodSummary::new(income, expense)
}

pub fn category_totals(transactions: &[Transaction]) -> CategorySummary {
    let mut totals = CategorySummary::new();

    for t in transactions.iter().filter(|t| t.is_expense()) {
        let total = totals.entry(t.category.clone()).or_insert(Decimal::ZERO);
        *total = accumulate(*total, t.amount);
    }

    totals
}

/// Groups by exact date string, newest calendar day first. Input order is kept
/// inside a group, and groups landing on the same day keep the order in which
/// they first appeared.
pub fn group_by_date(transactions: &[Transaction]) -> Vec<DayGroup<'_>> {
    let mut groups: Vec<DayGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for t in transactions {
        match index.get(t.date.as_str()) {
            Some(&i) => groups[i].transactions.push(t),
            None => {
                index.insert(t.date.as_str(), groups.len());
                groups.push(DayGroup {
                    date: &t.date,
                    day: t.day,
                    transactions: vec![t],
                });
            }
        }
    }

    // sort_by is stable
    groups.sort_by(|a, b| b.day.cmp(&a.day));
    groups
}

/// The `count` most recent transactions, newest first.
pub fn recent(transactions: &[Transaction], count: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.day.cmp(&a.day));
    sorted.truncate(count);
    sorted
}

/// Share of `limit` already spent, as a percentage in `[0, 100]`.
/// A missing or non-positive limit reads as 0.
pub fn budget_progress(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    spent
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
