use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

#[derive(Template)]
#[template(path = "alert.html")]
struct AlertTemplate<'a> {
    active: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Renders the page shown when a screen could not be built.
pub fn alert_response(status: StatusCode, message: &str) -> Response {
    let template = AlertTemplate {
        active: "",
        title: status.canonical_reason().unwrap_or("Error"),
        message,
    };

    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render alert page: {}", e);
            (status, message.to_string()).into_response()
        }
    }
}
