use crate::models::{FinancialSummary, NewTransaction, Transaction, TransactionType};
use common::models::PeriodSummary;
use common::period::{iso_date, Month};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sheets::{ApiError, SheetClient, Transport};

// Every field is optional so a single bad row never fails the whole list.
#[derive(Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    id: Option<Value>,
    date: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    category: Option<String>,
    content: Option<String>,
    amount: Option<Decimal>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = String;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let date = record.date.ok_or("missing date")?;
        let kind = record.kind.ok_or("missing type")?;
        let amount = record.amount.ok_or("missing amount")?;

        let transaction = Transaction::new(
            &date,
            TransactionType::from_label(&kind),
            record.category.as_deref().unwrap_or_default(),
            record.content.as_deref().unwrap_or_default(),
            amount,
        )?;

        Ok(match record.id {
            Some(Value::String(id)) if !id.is_empty() => transaction.with_id(id),
            Some(Value::Number(id)) => transaction.with_id(id.to_string()),
            _ => transaction,
        })
    }
}

#[derive(Deserialize)]
struct SummaryRecord {
    #[serde(default)]
    income: Decimal,
    #[serde(default)]
    expense: Decimal,
    #[serde(default, rename = "expenseCategories")]
    expense_categories: Option<Vec<CategoryAmountRecord>>,
}

#[derive(Deserialize)]
struct CategoryAmountRecord {
    category: String,
    amount: Decimal,
}

impl From<SummaryRecord> for FinancialSummary {
    fn from(record: SummaryRecord) -> Self {
        FinancialSummary {
            // balance is recomputed rather than trusted
            summary: PeriodSummary::new(record.income, record.expense),
            expense_categories: record
                .expense_categories
                .map(|rows| rows.into_iter().map(|r| (r.category, r.amount)).collect()),
        }
    }
}

pub(crate) struct TransactionRepository<'a, T> {
    sheets: &'a SheetClient<T>,
}

impl<'a, T: Transport> TransactionRepository<'a, T> {
    pub fn new(sheets: &'a SheetClient<T>) -> Self {
        Self { sheets }
    }

    pub async fn list_by_month(&self, month: Month) -> Result<Vec<Transaction>, ApiError> {
        let records: Vec<TransactionRecord> = self
            .sheets
            .fetch_records(
                "getTransactionsByMonth",
                &[("month", month.month().to_string()), ("year", month.year().to_string())],
            )
            .await?;

        let mut transactions = Vec::with_capacity(records.len());
        for record in records {
            match Transaction::try_from(record) {
                Ok(t) => transactions.push(t),
                Err(reason) => tracing::warn!("Skipping transaction for {}: {}", month, reason),
            }
        }

        Ok(transactions)
    }

    pub async fn summary_for(&self, month: Month) -> Result<FinancialSummary, ApiError> {
        let record: SummaryRecord = self
            .sheets
            .query(
                "getFinancialSummary",
                &[
                    ("startDate", iso_date(month.first_day())),
                    ("endDate", iso_date(month.last_day())),
                ],
            )
            .await?;

        Ok(record.into())
    }

    pub async fn create(&self, req: &NewTransaction) -> Result<(), ApiError> {
        self.sheets.mutate("addTransaction", req.to_body()).await
    }

    pub async fn update(&self, id: &str, req: &NewTransaction) -> Result<(), ApiError> {
        let mut body = req.to_body();
        body["id"] = json!(id);
        self.sheets.mutate("updateTransaction", body).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.sheets.mutate("deleteTransaction", json!({ "id": id })).await
    }
}
