//! Client for the spreadsheet-backed API.
//!
//! The sheet is fronted by a web app that dispatches on an `action`
//! parameter. Reads are GET requests with their parameters in the query
//! string, writes are JSON POSTs. Both carry the `sheetId` being worked on.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;

pub mod testing;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Status(u16, String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Application(String),
    #[error("Change rejected: {0}")]
    Rejected(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully addressed call, ready for a [`Transport`].
#[derive(Debug, Clone)]
pub struct SheetRequest {
    pub action: String,
    pub method: Method,
    pub url: Url,
    pub body: Value,
}

/// Moves a [`SheetRequest`] over the wire and hands back the decoded JSON body.
pub trait Transport: Send + Sync {
    fn send(&self, request: SheetRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Transport for HttpTransport {
    async fn send(&self, request: SheetRequest) -> Result<Value, ApiError> {
        let builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url).json(&request.body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status").to_string(),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Clone)]
pub struct SheetClient<T = HttpTransport> {
    transport: T,
    api_url: Url,
    sheet_id: String,
    proxy_url: Option<Url>,
}

impl SheetClient {
    pub fn new(api_url: &str, sheet_id: &str, proxy_url: Option<&str>) -> Result<Self, ApiError> {
        Self::with_transport(HttpTransport::default(), api_url, sheet_id, proxy_url)
    }
}

impl<T: Transport> SheetClient<T> {
    pub fn with_transport(
        transport: T,
        api_url: &str,
        sheet_id: &str,
        proxy_url: Option<&str>,
    ) -> Result<Self, ApiError> {
        let api_url = parse_url(api_url)?;
        let proxy_url = proxy_url.map(parse_url).transpose()?;

        Ok(Self {
            transport,
            api_url,
            sheet_id: sheet_id.to_string(),
            proxy_url,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Reads a single JSON document for `action`.
    #[tracing::instrument(skip(self, params))]
    pub async fn query<R: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<R, ApiError> {
        let value = self.dispatch(self.build_get(action, params)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", action, e)))
    }

    /// Reads a list of records for `action`, dropping the entries that do not
    /// decode as `R` instead of failing the whole list.
    #[tracing::instrument(skip(self, params))]
    pub async fn fetch_records<R: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<R>, ApiError> {
        let items = match self.dispatch(self.build_get(action, params)).await? {
            Value::Array(items) => items,
            Value::Null => return Ok(Vec::new()),
            other => {
                return Err(ApiError::Decode(format!(
                    "{}: expected a list, got {}",
                    action, other
                )));
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<R>(item) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping malformed {} record #{}: {}", action, index, e),
            }
        }

        Ok(records)
    }

    /// Sends a write and requires the sheet to confirm it with `success: true`.
    #[tracing::instrument(skip(self, body))]
    pub async fn mutate(&self, action: &str, body: Value) -> Result<(), ApiError> {
        let value = self.dispatch(self.build_post(action, body)).await?;

        if value.get("success").and_then(Value::as_bool) == Some(true) {
            return Ok(());
        }

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("the sheet did not confirm the change");
        Err(ApiError::Rejected(message.to_string()))
    }

    async fn dispatch(&self, request: SheetRequest) -> Result<Value, ApiError> {
        tracing::debug!(action = %request.action, method = ?request.method, "Calling sheet API");

        let value = self.transport.send(request).await?;
        if let Some(message) = application_error(&value) {
            return Err(ApiError::Application(message));
        }

        Ok(value)
    }

    fn build_get(&self, action: &str, params: &[(&str, String)]) -> SheetRequest {
        let mut target = self.api_url.clone();
        {
            let mut query = target.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("action", action);
            query.append_pair("sheetId", &self.sheet_id);
        }

        SheetRequest {
            action: action.to_string(),
            method: Method::Get,
            url: self.route(&target),
            body: Value::Null,
        }
    }

    fn build_post(&self, action: &str, body: Value) -> SheetRequest {
        let mut payload = Map::new();
        payload.insert("action".into(), Value::String(action.to_string()));
        payload.insert("sheetId".into(), Value::String(self.sheet_id.clone()));
        if let Value::Object(fields) = body {
            payload.extend(fields);
        }

        SheetRequest {
            action: action.to_string(),
            method: Method::Post,
            url: self.route(&self.api_url),
            body: Value::Object(payload),
        }
    }

    // The proxy takes the real target as its `url` parameter.
    fn route(&self, target: &Url) -> Url {
        match &self.proxy_url {
            Some(proxy) => {
                let mut url = proxy.clone();
                url.query_pairs_mut().append_pair("url", target.as_str());
                url
            }
            None => target.clone(),
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
}

// The web app reports failures in-band as `{"error": ...}` with a 200 status.
fn application_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_client, StubTransport};
    use serde::Deserialize;
    use serde_json::json;

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_get_carries_action_and_sheet_id() {
        let client = stub_client(StubTransport::new());
        let request = client.build_get("getTransactionsByMonth", &[("month", "3".into()), ("year", "2024".into())]);

        assert_eq!(request.method, Method::Get);
        assert_eq!(query_value(&request.url, "action").as_deref(), Some("getTransactionsByMonth"));
        assert_eq!(query_value(&request.url, "sheetId").as_deref(), Some("test-sheet"));
        assert_eq!(query_value(&request.url, "month").as_deref(), Some("3"));
        assert_eq!(query_value(&request.url, "year").as_deref(), Some("2024"));
    }

    #[test]
    fn test_proxy_wraps_target_url() {
        let client = SheetClient::with_transport(
            StubTransport::new(),
            "https://script.test/exec",
            "abc",
            Some("https://proxy.test/fn"),
        )
        .unwrap();

        let request = client.build_get("getCategories", &[]);
        assert_eq!(request.url.host_str(), Some("proxy.test"));

        let target = Url::parse(&query_value(&request.url, "url").unwrap()).unwrap();
        assert_eq!(target.host_str(), Some("script.test"));
        assert_eq!(query_value(&target, "action").as_deref(), Some("getCategories"));

        let post = client.build_post("addKeyword", json!({}));
        assert_eq!(query_value(&post.url, "url").as_deref(), Some("https://script.test/exec"));
    }

    #[test]
    fn test_post_body_merges_fields() {
        let client = stub_client(StubTransport::new());
        let request = client.build_post("deleteKeyword", json!({ "category": "Food", "keyword": "pho" }));

        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.body,
            json!({ "action": "deleteKeyword", "sheetId": "test-sheet", "category": "Food", "keyword": "pho" })
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let result = SheetClient::with_transport(StubTransport::new(), "not a url", "abc", None);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_in_band_error_is_reported() {
        let client = stub_client(StubTransport::new().respond("getCategories", json!({ "error": "Sheet not found" })));

        let result: Result<Vec<String>, _> = client.query("getCategories", &[]).await;
        match result {
            Err(ApiError::Application(msg)) => assert_eq!(msg, "Sheet not found"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_fetch_records_skips_malformed_entries() {
        #[derive(Deserialize)]
        struct Row {
            amount: f64,
        }

        let client = stub_client(StubTransport::new().respond(
            "getTransactionsByMonth",
            json!([{ "amount": 10.0 }, { "amount": "lots" }, { "amount": 2.5 }]),
        ));

        let rows: Vec<Row> = client.fetch_records("getTransactionsByMonth", &[]).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.amount).collect::<Vec<_>>(), vec![10.0, 2.5]);
    }

    #[tokio::test]
    async fn test_fetch_records_rejects_non_list() {
        let client = stub_client(StubTransport::new().respond("getKeywords", json!({ "rows": [] })));
        let result: Result<Vec<Value>, _> = client.fetch_records("getKeywords", &[]).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_mutate_requires_confirmation() {
        let client = stub_client(
            StubTransport::new()
                .respond("addKeyword", json!({ "success": true }))
                .respond("deleteKeyword", json!({ "success": false, "message": "Keyword not found" })),
        );

        client.mutate("addKeyword", json!({ "category": "Food" })).await.unwrap();

        match client.mutate("deleteKeyword", json!({})).await {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Keyword not found"),
            other => panic!("unexpected result: {:?}", other),
        }

        let sent = client.transport().requests_for("addKeyword");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body["category"], "Food");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = stub_client(StubTransport::new().fail("getMonthlyData", "connection reset"));
        let result: Result<Value, _> = client.query("getMonthlyData", &[]).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
