use crate::models::YearReport;
use crate::repository::ReportRepository;
use common::SessionCache;
use sheets::{ApiError, SheetClient, Transport};
use tokio::sync::RwLock;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sheet API error: {0}")]
    Api(String),
    #[error("Internal error: {0}")]
    Infrastructure(String),
}

impl From<ApiError> for ReportError {
    fn from(err: ApiError) -> Self {
        ReportError::Api(err.to_string())
    }
}

pub struct ReportService;

impl ReportService {
    /// The monthly report for `year`. The last fetched year is kept in the
    /// session cache until a transaction changes.
    #[instrument(skip(sheets, cache))]
    pub async fn year_report<T: Transport>(
        sheets: &SheetClient<T>,
        cache: &RwLock<SessionCache>,
        year: i32,
    ) -> Result<YearReport, ReportError> {
        if let Some(cached) = cache.read().await.report(year) {
            tracing::debug!("Serving report for {} from cache", year);
            return Ok(YearReport::from_months(year, cached));
        }

        let months = ReportRepository::new(sheets).monthly_data(year).await.map_err(|e| {
            tracing::error!("Failed to get monthly data for {}: {}", year, e);
            ReportError::from(e)
        })?;

        let report = YearReport::from_months(year, &months);
        cache.write().await.store_report(year, months);
        Ok(report)
    }
}
