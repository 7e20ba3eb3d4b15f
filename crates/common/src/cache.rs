use crate::models::MonthlyTotals;

/// Data remembered between page loads.
///
/// Holds the category list and the most recently fetched yearly report.
/// Writes to the sheet drop the entries they make stale.
#[derive(Debug, Default)]
pub struct SessionCache {
    categories: Option<Vec<String>>,
    report: Option<YearReport>,
}

#[derive(Debug)]
struct YearReport {
    year: i32,
    months: Vec<MonthlyTotals>,
}

impl SessionCache {
    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref()
    }

    pub fn store_categories(&mut self, categories: Vec<String>) {
        self.categories = Some(categories);
    }

    pub fn invalidate_categories(&mut self) {
        if self.categories.take().is_some() {
            tracing::debug!("Category cache invalidated");
        }
    }

    /// The cached report, if it was fetched for `year`.
    pub fn report(&self, year: i32) -> Option<&[MonthlyTotals]> {
        self.report
            .as_ref()
            .filter(|r| r.year == year)
            .map(|r| r.months.as_slice())
    }

    /// Replaces the cached report; only one year is kept.
    pub fn store_report(&mut self, year: i32, months: Vec<MonthlyTotals>) {
        self.report = Some(YearReport { year, months });
    }

    pub fn invalidate_report(&mut self) {
        if self.report.take().is_some() {
            tracing::debug!("Report cache invalidated");
        }
    }
}
