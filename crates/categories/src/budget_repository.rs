use crate::models::{BudgetLimits, BudgetUpdate};
use common::period::Month;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};
use sheets::{ApiError, SheetClient, Transport};
use std::str::FromStr;

pub(crate) struct BudgetRepository<'a, T> {
    sheets: &'a SheetClient<T>,
}

impl<'a, T: Transport> BudgetRepository<'a, T> {
    pub fn new(sheets: &'a SheetClient<T>) -> Self {
        Self { sheets }
    }

    pub async fn get_for_month(&self, month: Month) -> Result<BudgetLimits, ApiError> {
        let raw: Option<Map<String, Value>> = self
            .sheets
            .query(
                "getBudgets",
                &[("month", month.month().to_string()), ("year", month.year().to_string())],
            )
            .await?;

        let mut limits = BudgetLimits::new();
        for (category, value) in raw.unwrap_or_default() {
            match parse_limit(&value) {
                Some(limit) => {
                    limits.insert(category, limit);
                }
                None => tracing::warn!("Ignoring unreadable budget for {}: {}", category, value),
            }
        }

        Ok(limits)
    }

    pub async fn save(&self, update: &BudgetUpdate) -> Result<(), ApiError> {
        let budgets: Map<String, Value> = update
            .limits
            .iter()
            .map(|(category, limit)| (category.clone(), Value::from(limit.to_f64().unwrap_or_default())))
            .collect();

        self.sheets
            .mutate(
                "saveBudgets",
                json!({
                    "month": update.month.month(),
                    "year": update.month.year(),
                    "budgets": budgets,
                }),
            )
            .await
    }
}

// Sheet cells come back as numbers, numeric strings or blanks.
fn parse_limit(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) if !s.trim().is_empty() => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sheets::testing::{stub_client, StubTransport};

    #[tokio::test]
    async fn test_get_for_month() {
        let sheets = stub_client(StubTransport::new().respond(
            "getBudgets",
            json!({ "Food": 1500000, "Rent": "4000000", "Fun": "", "Misc": null }),
        ));
        let repo = BudgetRepository::new(&sheets);

        let limits = repo.get_for_month(Month::new(2024, 3).unwrap()).await.unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits["Food"], dec!(1500000));
        assert_eq!(limits["Rent"], dec!(4000000));

        let sent = sheets.transport().requests_for("getBudgets").remove(0);
        let query: Vec<(String, String)> = sent.url.query_pairs().into_owned().collect();
        assert!(query.contains(&("month".to_string(), "3".to_string())));
        assert!(query.contains(&("year".to_string(), "2024".to_string())));
    }

    #[tokio::test]
    async fn test_no_budgets_yet() {
        let sheets = stub_client(StubTransport::new().respond("getBudgets", Value::Null));
        let repo = BudgetRepository::new(&sheets);

        assert!(repo.get_for_month(Month::new(2024, 3).unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_sends_whole_month() {
        let sheets = stub_client(StubTransport::new().respond("saveBudgets", json!({ "success": true })));
        let repo = BudgetRepository::new(&sheets);

        let mut limits = BudgetLimits::new();
        limits.insert("Food".into(), dec!(1500000));
        limits.insert("Fun".into(), dec!(250000.5));
        let update = BudgetUpdate { month: Month::new(2024, 3).unwrap(), limits };

        repo.save(&update).await.unwrap();

        let sent = sheets.transport().requests_for("saveBudgets").remove(0);
        assert_eq!(sent.body["month"], 3);
        assert_eq!(sent.body["year"], 2024);
        assert_eq!(sent.body["budgets"]["Food"], 1500000.0);
        assert_eq!(sent.body["budgets"]["Fun"], 250000.5);
    }
}
