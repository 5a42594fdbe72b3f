use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};

/// A calendar month, the billing period fees are generated and totalled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> AppResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::ValidationError(format!(
                "Invalid billing period {month}/{year}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Due date for a plan's due day, clamped to the end of short months.
    pub fn due_date(&self, due_day: i32) -> NaiveDate {
        let day = (due_day.max(1) as u32).min(self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.last_day())
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window() {
        let period = BillingPeriod::new(11, 2025).unwrap();
        assert_eq!(period.first_day(), date(2025, 11, 1));
        assert_eq!(period.last_day(), date(2025, 11, 30));

        let december = BillingPeriod::new(12, 2025).unwrap();
        assert_eq!(december.last_day(), date(2025, 12, 31));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(BillingPeriod::new(2, 2024).unwrap().days_in_month(), 29);
        assert_eq!(BillingPeriod::new(2, 2025).unwrap().days_in_month(), 28);
        assert_eq!(BillingPeriod::new(4, 2025).unwrap().days_in_month(), 30);
        assert_eq!(BillingPeriod::new(1, 2025).unwrap().days_in_month(), 31);
    }

    #[test]
    fn test_due_date_clamped() {
        let november = BillingPeriod::new(11, 2025).unwrap();
        assert_eq!(november.due_date(31), date(2025, 11, 30));
        assert_eq!(november.due_date(10), date(2025, 11, 10));

        let february = BillingPeriod::new(2, 2025).unwrap();
        assert_eq!(february.due_date(30), date(2025, 2, 28));
    }

    #[test]
    fn test_invalid_month() {
        assert!(BillingPeriod::new(13, 2025).is_err());
        assert!(BillingPeriod::new(0, 2025).is_err());
    }

    #[test]
    fn test_containing_and_display() {
        let period = BillingPeriod::containing(date(2026, 3, 17));
        assert_eq!(period, BillingPeriod { year: 2026, month: 3 });
        assert_eq!(period.to_string(), "2026-03");
    }
}
