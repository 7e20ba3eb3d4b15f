use crate::aggregator::{budget_progress, category_totals, recent, summarize};
use crate::models::{NewTransaction, Transaction, TransactionForm};
use crate::repository::TransactionRepository;
use categories::service::{CategoryError, CategoryService};
use common::SessionCache;
use common::models::PeriodSummary;
use common::period::Month;
use rust_decimal::Decimal;
use sheets::{ApiError, SheetClient, Transport};
use tokio::sync::RwLock;
use tracing::instrument;
use validator::Validate;

const RECENT_COUNT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sheet API error: {0}")]
    Api(String),
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl From<ApiError> for TransactionError {
    fn from(err: ApiError) -> Self {
        TransactionError::Api(err.to_string())
    }
}

impl From<CategoryError> for TransactionError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::InvalidInput(msg) => TransactionError::InvalidInput(msg),
            CategoryError::Api(msg) => TransactionError::Api(msg),
            CategoryError::Infrastructure(msg) => TransactionError::Infrastructure(msg),
        }
    }
}

#[derive(Debug)]
pub struct DashboardData {
    pub summary: PeriodSummary,
    pub expense_breakdown: Vec<(String, Decimal)>,
    pub recent: Vec<Transaction>,
}

#[derive(Debug)]
pub struct MonthData {
    pub summary: PeriodSummary,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub limit: Option<Decimal>,
    pub spent: Decimal,
    pub progress: Decimal,
}

impl BudgetLine {
    pub fn is_over_budget(&self) -> bool {
        self.limit.is_some_and(|limit| self.spent > limit)
    }
}

pub struct TransactionService;

impl TransactionService {
    /// Summary cards, spend breakdown and latest entries for `month`.
    #[instrument(skip(sheets))]
    pub async fn dashboard<T: Transport>(
        sheets: &SheetClient<T>,
        month: Month,
    ) -> Result<DashboardData, TransactionError> {
        let repo = TransactionRepository::new(sheets);
        let (financial, transactions) = tokio::try_join!(repo.summary_for(month), repo.list_by_month(month))
            .map_err(|e| {
                tracing::error!("Dashboard fetch failed for {}: {}", month, e);
                TransactionError::from(e)
            })?;

        let expense_breakdown = match financial.expense_categories {
            Some(rows) => rows,
            None => category_totals(&transactions).into_iter().collect(),
        };

        Ok(DashboardData {
            summary: financial.summary,
            expense_breakdown,
            recent: recent(&transactions, RECENT_COUNT).into_iter().cloned().collect(),
        })
    }

    #[instrument(skip(sheets))]
    pub async fn month_view<T: Transport>(
        sheets: &SheetClient<T>,
        month: Month,
    ) -> Result<MonthData, TransactionError> {
        let transactions = TransactionRepository::new(sheets).list_by_month(month).await?;

        Ok(MonthData {
            summary: summarize(&transactions),
            transactions,
        })
    }

    /// Limits set for `month` next to what was actually spent. Categories come
    /// from the sheet's list first, then any budgeted or spent category it lacks.
    #[instrument(skip(sheets, cache))]
    pub async fn budget_view<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        month: Month,
    ) -> Result<Vec<BudgetLine>, TransactionError> {
        let repo = TransactionRepository::new(sheets);
        let (limits, categories, transactions) = tokio::try_join!(
            async { CategoryService::budgets_for_month(sheets, month).await.map_err(TransactionError::from) },
            async { CategoryService::list_categories(sheets, cache).await.map_err(TransactionError::from) },
            async { repo.list_by_month(month).await.map_err(TransactionError::from) },
        )?;

        let spent = category_totals(&transactions);

        let mut names: Vec<String> = categories;
        for extra in limits.keys().chain(spent.keys()) {
            if !names.contains(extra) {
                names.push(extra.clone());
            }
        }

        Ok(names
            .into_iter()
            .map(|category| {
                let limit = limits.get(&category).copied();
                let spent = spent.get(&category).copied().unwrap_or(Decimal::ZERO);
                BudgetLine {
                    progress: budget_progress(spent, limit.unwrap_or(Decimal::ZERO)),
                    category,
                    limit,
                    spent,
                }
            })
            .collect())
    }

    /// Returns the month the new transaction falls in.
    #[instrument(skip(sheets, cache))]
    pub async fn create_transaction<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        form: TransactionForm,
    ) -> Result<Month, TransactionError> {
        let req = Self::validate(&form)?;

        TransactionRepository::new(sheets).create(&req).await?;

        cache.write().await.invalidate_report();
        Ok(Month::containing(req.date()))
    }

    #[instrument(skip(sheets, cache))]
    pub async fn update_transaction<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        form: TransactionForm,
    ) -> Result<Month, TransactionError> {
        let id = form
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TransactionError::InvalidInput("Missing transaction id".into()))?
            .to_string();
        let req = Self::validate(&form)?;

        TransactionRepository::new(sheets).update(&id, &req).await?;

        cache.write().await.invalidate_report();
        Ok(Month::containing(req.date()))
    }

    #[instrument(skip(sheets, cache))]
    pub async fn delete_transaction<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        id: &str,
    ) -> Result<(), TransactionError> {
        if id.trim().is_empty() {
            return Err(TransactionError::InvalidInput("Missing transaction id".into()));
        }

        TransactionRepository::new(sheets).delete(id.trim()).await?;

        cache.write().await.invalidate_report();
        Ok(())
    }

    fn validate(form: &TransactionForm) -> Result<NewTransaction, TransactionError> {
        form.validate()
            .map_err(|e| TransactionError::InvalidInput(e.to_string()))?;
        NewTransaction::from_form(form).map_err(TransactionError::InvalidInput)
    }
}
