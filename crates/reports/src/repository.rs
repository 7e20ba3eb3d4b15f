use common::models::MonthlyTotals;
use sheets::{ApiError, SheetClient, Transport};

pub(crate) struct ReportRepository<'a, T> {
    sheets: &'a SheetClient<T>,
}

impl<'a, T: Transport> ReportRepository<'a, T> {
    pub fn new(sheets: &'a SheetClient<T>) -> Self {
        Self { sheets }
    }

    /// Monthly totals for `year`, ordered by month. Rows outside 1..=12 are dropped.
    pub async fn monthly_data(&self, year: i32) -> Result<Vec<MonthlyTotals>, ApiError> {
        let mut months: Vec<MonthlyTotals> = self
            .sheets
            .fetch_records("getMonthlyData", &[("year", year.to_string())])
            .await?;

        months.retain(|m| (1..=12).contains(&m.month));
        months.sort_by_key(|m| m.month);
        Ok(months)
    }
}
