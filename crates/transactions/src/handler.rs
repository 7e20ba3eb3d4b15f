use crate::aggregator::group_by_date;
use crate::models::{Transaction, TransactionForm, TransactionType};
use crate::service::{BudgetLine, TransactionError, TransactionService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use categories::models::LIMIT_FIELD_PREFIX;
use categories::service::CategoryService;
use common::format::{day_label, format_currency, input_amount, script_json};
use common::models::PeriodSummary;
use common::period::{iso_date, Month};
use common::{alert::alert_response, AppState};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let status = match self {
            TransactionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TransactionError::Api(_) => StatusCode::BAD_GATEWAY,
            TransactionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        alert_response(status, &self.to_string())
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub active: &'static str,
    pub title: String,
    pub month_label: String,
    pub overview: FinancialOverview,
    pub chart_json: String,
    pub has_breakdown: bool,
    pub recent: Vec<TransactionView>,
}

#[derive(Template)]
#[template(path = "transactions.html")]
pub struct MonthViewTemplate {
    pub active: &'static str,
    pub title: String,
    pub month: String,
    pub month_label: String,
    pub prev_month: String,
    pub next_month: String,
    pub overview: FinancialOverview,
    pub groups: Vec<DayGroupView>,
    pub categories: Vec<String>,
    pub default_date: String,
}

#[derive(Template)]
#[template(path = "budgets.html")]
pub struct BudgetViewTemplate {
    pub active: &'static str,
    pub title: String,
    pub notice: String,
    pub month: String,
    pub month_label: String,
    pub prev_month: String,
    pub next_month: String,
    pub rows: Vec<BudgetRowView>,
}

pub struct FinancialOverview {
    pub total_income: String,
    pub total_expenses: String,
    pub net_balance: String,
    pub net_is_positive: bool,
}

impl FinancialOverview {
    fn new(summary: &PeriodSummary, symbol: &str) -> Self {
        Self {
            total_income: format_currency(summary.income, symbol),
            total_expenses: format_currency(summary.expense, symbol),
            net_balance: format_currency(summary.balance, symbol),
            net_is_positive: !summary.balance.is_sign_negative(),
        }
    }
}

pub struct DayGroupView {
    pub label: String,
    pub transactions: Vec<TransactionView>,
}

pub struct TransactionView {
    pub id: String,
    pub day_label: String,
    pub category: String,
    pub content: String,
    pub amount: String,
    pub is_income: bool,
    pub type_label: String,
    /// False for unknown types and rows without an id.
    pub editable: bool,
    // prefill values for the edit form
    pub iso_date: String,
    pub amount_input: String,
    pub kind_value: String,
}

impl TransactionView {
    fn new(t: &Transaction, symbol: &str) -> Self {
        let sign = match t.kind {
            TransactionType::Income => "+",
            TransactionType::Expense => "-",
            TransactionType::Unknown(_) => "",
        };
        let kind_value = match t.kind {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Unknown(_) => "",
        };
        let id = t.id.clone().unwrap_or_default();

        Self {
            editable: !id.is_empty() && !kind_value.is_empty(),
            id,
            day_label: day_label(t.day),
            category: t.category.clone(),
            content: t.content.clone(),
            amount: format!("{}{}", sign, format_currency(t.amount, symbol)),
            is_income: t.is_income(),
            type_label: t.kind.label().to_string(),
            iso_date: iso_date(t.day),
            amount_input: input_amount(t.amount),
            kind_value: kind_value.to_string(),
        }
    }
}

pub struct BudgetRowView {
    pub category: String,
    pub field_name: String,
    pub limit_input: String,
    pub limit_display: String,
    pub spent_display: String,
    pub percent: String,
    pub has_limit: bool,
    pub is_over_budget: bool,
}

impl BudgetRowView {
    fn new(line: &BudgetLine, symbol: &str) -> Self {
        Self {
            category: line.category.clone(),
            field_name: format!("{}{}", LIMIT_FIELD_PREFIX, line.category),
            limit_input: line.limit.map(input_amount).unwrap_or_default(),
            limit_display: line
                .limit
                .map(|l| format_currency(l, symbol))
                .unwrap_or_else(|| "No limit".to_string()),
            spent_display: format_currency(line.spent, symbol),
            percent: line.progress.round().to_string(),
            has_limit: line.limit.is_some(),
            is_over_budget: line.is_over_budget(),
        }
    }
}

#[derive(Serialize)]
struct BreakdownChart {
    labels: Vec<String>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
    pub saved: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteTransactionForm {
    pub id: String,
    pub month: String,
}

pub fn dashboard_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_dashboard))
        .with_state(state)
}

pub fn transactions_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Specific routes first
        .route("/", get(transactions_redirect))
        .route("/add", post(create_transaction))
        .route("/update", post(update_transaction))
        .route("/delete", post(delete_transaction))
        // Then parameterized routes
        .route("/{month}", get(get_month_view))
        .with_state(state)
}

pub fn budgets_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(budgets_redirect))
        .route("/{month}", get(get_budget_view).post(save_budgets))
        .with_state(state)
}

fn parse_month(raw: &str) -> Result<Month, TransactionError> {
    raw.parse().map_err(TransactionError::InvalidInput)
}

fn render<T: Template>(template: &T) -> Result<Html<String>, TransactionError> {
    template
        .render()
        .map(Html)
        .map_err(|e| TransactionError::Infrastructure(e.to_string()))
}

// `?month=YYYY-MM` from the month picker, otherwise the current month.
fn requested_month(query: &MonthQuery) -> Month {
    query
        .month
        .as_deref()
        .and_then(|m| m.parse().ok())
        .unwrap_or_else(Month::current)
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = Month::current();
    tracing::info!("Fetching dashboard for: {}", month);

    let data = TransactionService::dashboard(&state.sheets, month).await?;
    let symbol = &state.config.currency_symbol;

    let chart = BreakdownChart {
        labels: data.expense_breakdown.iter().map(|(c, _)| c.clone()).collect(),
        values: data
            .expense_breakdown
            .iter()
            .map(|(_, amount)| amount.to_f64().unwrap_or_default())
            .collect(),
    };

    let template = DashboardTemplate {
        active: "dashboard",
        title: "Overview".to_string(),
        month_label: month.label(),
        overview: FinancialOverview::new(&data.summary, symbol),
        chart_json: script_json(&chart),
        has_breakdown: !data.expense_breakdown.is_empty(),
        recent: data.recent.iter().map(|t| TransactionView::new(t, symbol)).collect(),
    };

    render(&template)
}

async fn transactions_redirect(Query(query): Query<MonthQuery>) -> Redirect {
    Redirect::to(&format!("/transactions/{}", requested_month(&query)))
}

async fn get_month_view(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = parse_month(&month)?;
    tracing::info!("Fetching month view for: {}", month);

    let (data, categories) = tokio::try_join!(
        TransactionService::month_view(&state.sheets, month),
        async {
            CategoryService::list_categories(&state.sheets, &state.cache)
                .await
                .map_err(TransactionError::from)
        },
    )
    .map_err(|e| {
        tracing::error!("get_month_view error: {:?}", e);
        e
    })?;

    let symbol = &state.config.currency_symbol;
    let groups = group_by_date(&data.transactions)
        .into_iter()
        .map(|group| DayGroupView {
            label: day_label(group.day),
            transactions: group
                .transactions
                .into_iter()
                .map(|t| TransactionView::new(t, symbol))
                .collect(),
        })
        .collect();

    let today = chrono::Local::now().date_naive();
    let default_date = if Month::containing(today) == month { today } else { month.first_day() };

    let template = MonthViewTemplate {
        active: "transactions",
        title: "Transactions".to_string(),
        month: month.to_string(),
        month_label: month.label(),
        prev_month: month.previous().to_string(),
        next_month: month.next().to_string(),
        overview: FinancialOverview::new(&data.summary, symbol),
        groups,
        categories,
        default_date: iso_date(default_date),
    };

    render(&template)
}

async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<TransactionForm>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = TransactionService::create_transaction(&state.sheets, &state.cache, payload)
        .await
        .map_err(|e| {
            tracing::error!("create_transaction error: {:?}", e);
            e
        })?;

    Ok(Redirect::to(&format!("/transactions/{}", month)))
}

async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<TransactionForm>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = TransactionService::update_transaction(&state.sheets, &state.cache, payload)
        .await
        .map_err(|e| {
            tracing::error!("update_transaction error: {:?}", e);
            e
        })?;

    Ok(Redirect::to(&format!("/transactions/{}", month)))
}

async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<DeleteTransactionForm>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = parse_month(&payload.month)?;
    TransactionService::delete_transaction(&state.sheets, &state.cache, &payload.id).await?;

    Ok(Redirect::to(&format!("/transactions/{}", month)))
}

async fn budgets_redirect(Query(query): Query<MonthQuery>) -> Redirect {
    Redirect::to(&format!("/budgets/{}", requested_month(&query)))
}

async fn get_budget_view(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = parse_month(&month)?;
    tracing::info!("Fetching budgets for: {}", month);

    let lines = TransactionService::budget_view(&state.sheets, &state.cache, month).await?;
    let symbol = &state.config.currency_symbol;

    let template = BudgetViewTemplate {
        active: "budgets",
        title: "Budgets".to_string(),
        notice: if query.saved.is_some() { "Budgets saved.".to_string() } else { String::new() },
        month: month.to_string(),
        month_label: month.label(),
        prev_month: month.previous().to_string(),
        next_month: month.next().to_string(),
        rows: lines.iter().map(|line| BudgetRowView::new(line, symbol)).collect(),
    };

    render(&template)
}

async fn save_budgets(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, TransactionError> {
    let month = parse_month(&month)?;

    CategoryService::save_budgets(&state.sheets, &state.cache, month, &fields)
        .await
        .map_err(|e| {
            tracing::error!("save_budgets error: {:?}", e);
            TransactionError::from(e)
        })?;

    Ok(Redirect::to(&format!("/budgets/{}?saved=1", month)))
}
