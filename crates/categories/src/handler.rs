use crate::models::{AddKeywordForm, DeleteKeywordForm};
use crate::service::{CategoryError, CategoryService};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use common::{alert::alert_response, AppState};
use serde::Deserialize;
use std::sync::Arc;

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let status = match self {
            CategoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CategoryError::Api(_) => StatusCode::BAD_GATEWAY,
            CategoryError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        alert_response(status, &self.to_string())
    }
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub active: &'static str,
    pub title: String,
    pub notice: String,
    pub categories: Vec<String>,
    pub groups: Vec<KeywordGroupView>,
}

pub struct KeywordGroupView {
    pub category: String,
    pub icon: String,
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
pub struct NoticeQuery {
    pub saved: Option<String>,
}

pub fn settings_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(settings_view))
        .route("/keywords", post(add_keyword))
        .route("/keywords/delete", post(delete_keyword))
        .with_state(state)
}

async fn settings_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse, CategoryError> {
    let (keywords, categories) = tokio::try_join!(
        CategoryService::list_keywords(&state.sheets),
        CategoryService::list_categories(&state.sheets, &state.cache),
    )?;

    let groups = keywords
        .iter()
        .map(|row| KeywordGroupView {
            category: row.category.clone(),
            icon: row.icon.clone(),
            keywords: row.keyword_list().into_iter().map(str::to_string).collect(),
        })
        .collect();

    let notice = match query.saved.as_deref() {
        Some("added") => "Keyword added.",
        Some("deleted") => "Keyword deleted.",
        _ => "",
    };

    let template = SettingsTemplate {
        active: "settings",
        title: "Settings".to_string(),
        notice: notice.to_string(),
        categories,
        groups,
    };

    Ok(Html(template.render().map_err(|e| CategoryError::Infrastructure(e.to_string()))?))
}

async fn add_keyword(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<AddKeywordForm>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::add_keyword(&state.sheets, &state.cache, payload)
        .await
        .map_err(|e| {
            tracing::error!("add_keyword error: {:?}", e);
            e
        })?;

    Ok(Redirect::to("/settings?saved=added"))
}

async fn delete_keyword(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<DeleteKeywordForm>,
) -> Result<impl IntoResponse, CategoryError> {
    CategoryService::delete_keyword(&state.sheets, &state.cache, payload)
        .await
        .map_err(|e| {
            tracing::error!("delete_keyword error: {:?}", e);
            e
        })?;

    Ok(Redirect::to("/settings?saved=deleted"))
}
