use common::models::{accumulate, MonthlyTotals, PeriodSummary};
use rust_decimal::Decimal;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Income and expense per month for one calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearReport {
    pub year: i32,
    /// Always twelve entries, January first.
    pub months: Vec<MonthlyTotals>,
}

impl YearReport {
    /// Builds a full year from whatever months the sheet reported. Missing
    /// months read as zero; a month reported twice is summed.
    pub fn from_months(year: i32, reported: &[MonthlyTotals]) -> Self {
        let mut months: Vec<MonthlyTotals> = (1..=12)
            .map(|month| MonthlyTotals {
                month,
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
            })
            .collect();

        for m in reported {
            if let Some(slot) = months.get_mut((m.month as usize).wrapping_sub(1)) {
                slot.income = accumulate(slot.income, m.income);
                slot.expense = accumulate(slot.expense, m.expense);
            }
        }

        Self { year, months }
    }

    pub fn summary(&self) -> PeriodSummary {
        year_summary(&self.months)
    }

    /// Whether any month recorded income or expense.
    pub fn has_data(&self) -> bool {
        self.months.iter().any(|m| !m.income.is_zero() || !m.expense.is_zero())
    }
}

pub fn year_summary(months: &[MonthlyTotals]) -> PeriodSummary {
    let income = months.iter().fold(Decimal::ZERO, |total, m| accumulate(total, m.income));
    let expense = months.iter().fold(Decimal::ZERO, |total, m| accumulate(total, m.expense));
    PeriodSummary::new(income, expense)
}

/// The years offered by the report selector, newest first.
pub fn selectable_years(current: i32, count: usize) -> Vec<i32> {
    (0..count as i32).map(|offset| current - offset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(month: u32, income: Decimal, expense: Decimal) -> MonthlyTotals {
        MonthlyTotals { month, income, expense }
    }

    #[test]
    fn test_year_summary() {
        let months = vec![
            totals(1, dec!(1000), dec!(400)),
            totals(2, dec!(1000), dec!(1250.5)),
        ];

        let summary = year_summary(&months);
        assert_eq!(summary.income, dec!(2000));
        assert_eq!(summary.expense, dec!(1650.5));
        assert_eq!(summary.balance, dec!(349.5));

        assert_eq!(year_summary(&[]), PeriodSummary::default());
    }

    #[test]
    fn test_from_months_fills_gaps() {
        let report = YearReport::from_months(2024, &[
            totals(3, dec!(10), dec!(4)),
            totals(12, dec!(0), dec!(7)),
        ]);

        assert_eq!(report.months.len(), 12);
        assert_eq!(report.months[0], totals(1, dec!(0), dec!(0)));
        assert_eq!(report.months[2], totals(3, dec!(10), dec!(4)));
        assert_eq!(report.months[11].expense, dec!(7));
        assert_eq!(report.summary(), PeriodSummary::new(dec!(10), dec!(11)));
    }

    #[test]
    fn test_from_months_ignores_out_of_range_months() {
        let report = YearReport::from_months(2024, &[
            totals(0, dec!(10), dec!(0)),
            totals(13, dec!(10), dec!(0)),
            totals(5, dec!(1), dec!(0)),
            totals(5, dec!(2), dec!(0)),
        ]);

        assert_eq!(report.summary().income, dec!(3));
        assert_eq!(report.months[4].income, dec!(3));
    }

    #[test]
    fn test_has_data() {
        assert!(!YearReport::from_months(2024, &[]).has_data());
        assert!(!YearReport::from_months(2024, &[totals(3, dec!(0), dec!(0))]).has_data());
        assert!(YearReport::from_months(2024, &[totals(3, dec!(0), dec!(12))]).has_data());
    }

    #[test]
    fn test_huge_months_saturate() {
        let report = YearReport::from_months(2024, &[
            totals(1, Decimal::MAX, dec!(0)),
            totals(1, Decimal::MAX, dec!(0)),
            totals(2, Decimal::MAX, dec!(5)),
        ]);

        assert_eq!(report.months[0].income, Decimal::MAX);
        let summary = report.summary();
        assert_eq!(summary.income, Decimal::MAX);
        assert_eq!(summary.expense, dec!(5));
    }

    #[test]
    fn test_selectable_years() {
        assert_eq!(selectable_years(2024, 5), vec![2024, 2023, 2022, 2021, 2020]);
        assert!(selectable_years(2024, 0).is_empty());
    }
}
