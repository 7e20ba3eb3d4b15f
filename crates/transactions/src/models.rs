use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use validator::Validate;

/// Day-first format the sheet stores dates in.
pub const SHEET_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionType {
    Income,
    Expense,
    Unknown(String),
}

impl TransactionType {
    // Labels as written in the sheet's type column.
    pub const INCOME_LABEL: &'static str = "Thu nhập";
    pub const EXPENSE_LABEL: &'static str = "Chi tiêu";

    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label == Self::INCOME_LABEL || label.eq_ignore_ascii_case("income") {
            TransactionType::Income
        } else if label == Self::EXPENSE_LABEL || label.eq_ignore_ascii_case("expense") {
            TransactionType::Expense
        } else {
            TransactionType::Unknown(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TransactionType::Income => Self::INCOME_LABEL,
            TransactionType::Expense => Self::EXPENSE_LABEL,
            TransactionType::Unknown(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Option<String>, // sheet row reference, needed for edits
    pub date: String,       // as written in the sheet, 'DD/MM/YYYY'
    pub day: NaiveDate,
    pub kind: TransactionType,
    pub category: String,
    pub content: String,
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(
        date: &str,
        kind: TransactionType,
        category: &str,
        content: &str,
        amount: Decimal,
    ) -> Result<Self, String> {
        let day = parse_sheet_date(date).ok_or_else(|| format!("Unreadable date '{}'", date))?;
        if amount.is_sign_negative() {
            return Err(format!("Negative amount {}", amount));
        }

        Ok(Self {
            id: None,
            date: date.trim().to_string(),
            day,
            kind,
            category: category.trim().to_string(),
            content: content.trim().to_string(),
            amount,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SHEET_DATE_FORMAT).ok()
}

/// Income/expense totals plus the per-category spend the summary endpoint
/// may include.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSummary {
    pub summary: common::models::PeriodSummary,
    pub expense_categories: Option<Vec<(String, Decimal)>>,
}

/// Posted by the add and edit forms.
#[derive(Debug, Deserialize, Validate)]
pub struct TransactionForm {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Pick a date"))]
    pub date: String, // 'YYYY-MM-DD' from the date input
    #[validate(length(min = 1))]
    pub kind: String, // "income" | "expense"
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[validate(length(min = 1, message = "Amount is required"))]
    pub amount: String,
}

#[derive(Debug, PartialEq)]
pub struct NewTransaction {
    date: NaiveDate,
    kind: TransactionType,
    category: String,
    content: String,
    amount: Decimal,
}

impl NewTransaction {
    pub fn from_form(form: &TransactionForm) -> Result<Self, String> {
        let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Invalid date format, expected YYYY-MM-DD".to_string())?;

        let kind = match form.kind.trim() {
            "income" => TransactionType::Income,
            "expense" => TransactionType::Expense,
            other => return Err(format!("Unknown transaction type '{}'", other)),
        };

        let category = form.category.trim();
        if category.is_empty() {
            return Err("Category cannot be empty".to_string());
        }

        let amount = Decimal::from_str(&form.amount.trim().replace([' ', '_'], ""))
            .map_err(|_| "Amount must be a number".to_string())?;
        if amount <= Decimal::ZERO {
            return Err("Amount must be greater than zero".to_string());
        }

        Ok(Self {
            date,
            kind,
            category: category.to_string(),
            content: form.content.trim().to_string(),
            amount,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Fields in the shape the sheet stores them.
    pub fn to_body(&self) -> Value {
        json!({
            "date": self.date.format(SHEET_DATE_FORMAT).to_string(),
            "type": self.kind.label(),
            "category": self.category,
            "content": self.content,
            "amount": self.amount.to_f64().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn form(kind: &str, amount: &str) -> TransactionForm {
        TransactionForm {
            id: None,
            date: "2024-03-02".into(),
            kind: kind.into(),
            category: " Food ".into(),
            content: "Lunch".into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(TransactionType::from_label("Thu nhập"), TransactionType::Income);
        assert_eq!(TransactionType::from_label(" Chi tiêu "), TransactionType::Expense);
        assert_eq!(TransactionType::from_label("EXPENSE"), TransactionType::Expense);
        assert_eq!(TransactionType::from_label("Transfer"), TransactionType::Unknown("Transfer".into()));
    }

    #[test]
    fn test_new_transaction_parses_day_first() {
        let t = Transaction::new("02/03/2024", TransactionType::Expense, "Food", "", dec!(50000)).unwrap();
        assert_eq!(t.day, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(t.is_expense());
    }

    #[test]
    fn test_new_transaction_rejects_bad_input() {
        assert!(Transaction::new("2024-03-02", TransactionType::Expense, "Food", "", dec!(1)).is_err());
        assert!(Transaction::new("31/02/2024", TransactionType::Expense, "Food", "", dec!(1)).is_err());
        assert!(Transaction::new("01/03/2024", TransactionType::Expense, "Food", "", dec!(-1)).is_err());
    }

    #[test]
    fn test_new_transaction_from_form_expense() {
        let req = NewTransaction::from_form(&form("expense", "45500")).unwrap();
        assert_eq!(req.amount(), dec!(45500));

        let body = req.to_body();
        assert_eq!(body["date"], "02/03/2024");
        assert_eq!(body["type"], "Chi tiêu");
        assert_eq!(body["category"], "Food");
        assert_eq!(body["amount"], 45500.0);
    }

    #[test]
    fn test_new_transaction_from_form_income() {
        let req = NewTransaction::from_form(&form("income", "1 000 000")).unwrap();
        assert_eq!(req.amount(), dec!(1000000));
        assert_eq!(req.to_body()["type"], "Thu nhập");
    }

    #[test]
    fn test_new_transaction_from_form_rejects() {
        assert!(NewTransaction::from_form(&form("income", "0")).is_err());
        assert!(NewTransaction::from_form(&form("income", "abc")).is_err());
        assert!(NewTransaction::from_form(&form("gift", "10")).is_err());

        let mut bad_date = form("expense", "10");
        bad_date.date = "02/03/2024".into();
        assert!(NewTransaction::from_form(&bad_date).is_err());
    }
}
