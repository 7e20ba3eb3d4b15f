use crate::models::{selectable_years, MONTH_LABELS};
use crate::service::{ReportError, ReportService};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Datelike;
use common::format::{format_currency, script_json};
use common::{alert::alert_response, AppState};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const YEARS_SHOWN: usize = 5;

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = match self {
            ReportError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ReportError::Api(_) => StatusCode::BAD_GATEWAY,
            ReportError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        alert_response(status, &self.to_string())
    }
}

#[derive(Template)]
#[template(path = "reports.html")]
pub struct ReportTemplate {
    pub active: &'static str,
    pub title: String,
    pub year: i32,
    pub years: Vec<YearOption>,
    pub total_income: String,
    pub total_expenses: String,
    pub net_balance: String,
    pub net_is_positive: bool,
    pub has_data: bool,
    pub chart_json: String,
}

pub struct YearOption {
    pub value: i32,
    pub selected: bool,
}

#[derive(Serialize)]
struct MonthlyChart {
    labels: Vec<&'static str>,
    income: Vec<f64>,
    expense: Vec<f64>,
}

#[derive(Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

pub fn reports_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(reports_redirect))
        .route("/{year}", get(get_year_report))
        .with_state(state)
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

async fn reports_redirect(Query(query): Query<YearQuery>) -> Redirect {
    let year = query.year.unwrap_or_else(current_year);
    Redirect::to(&format!("/reports/{}", year))
}

async fn get_year_report(
    State(state): State<Arc<AppState>>,
    Path(year): Path<String>,
) -> Result<impl IntoResponse, ReportError> {
    let year: i32 = year
        .parse()
        .map_err(|_| ReportError::InvalidInput(format!("'{}' is not a year", year)))?;
    tracing::info!("Fetching report for: {}", year);

    let report = ReportService::year_report(&state.sheets, &state.cache, year).await?;
    let summary = report.summary();
    let symbol = &state.config.currency_symbol;

    let chart = MonthlyChart {
        labels: MONTH_LABELS.to_vec(),
        income: report.months.iter().map(|m| m.income.to_f64().unwrap_or_default()).collect(),
        expense: report.months.iter().map(|m| m.expense.to_f64().unwrap_or_default()).collect(),
    };

    let mut years = selectable_years(current_year(), YEARS_SHOWN);
    if !years.contains(&year) {
        years.push(year);
    }

    let template = ReportTemplate {
        active: "reports",
        title: format!("Report {}", year),
        year,
        years: years
            .into_iter()
            .map(|value| YearOption { value, selected: value == year })
            .collect(),
        total_income: format_currency(summary.income, symbol),
        total_expenses: format_currency(summary.expense, symbol),
        net_balance: format_currency(summary.balance, symbol),
        net_is_positive: !summary.balance.is_sign_negative(),
        has_data: report.has_data(),
        chart_json: script_json(&chart),
    };

    let html = template
        .render()
        .map_err(|e| ReportError::Infrastructure(e.to_string()))?;
    Ok(Html(html))
}
