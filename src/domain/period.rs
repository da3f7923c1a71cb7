use crate::error::{OrderError, Result};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// The inclusive date range a policy covers.
///
/// The day count is always derived from the two dates and never stored on
/// its own, so it cannot drift from the dates that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct PolicyPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawPeriod> for PolicyPeriod {
    type Error = OrderError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl PolicyPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(OrderError::ValidationError(format!(
                "Period end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// A period of whole calendar months starting on `start`.
    ///
    /// The end is the day before the same date `months` later, so
    /// consecutive periods never share a boundary day.
    pub fn of_months(start: NaiveDate, months: u32) -> Result<Self> {
        if months == 0 {
            return Err(OrderError::ValidationError(
                "Period length must be at least one month".to_string(),
            ));
        }
        let end = start
            .checked_add_months(Months::new(months))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .ok_or_else(|| {
                OrderError::ValidationError(format!("Period starting {start} is out of range"))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of covered days, counting both endpoints.
    pub fn number_of_days(&self) -> u32 {
        inclusive_day_count(self.start, self.end)
    }
}

/// `end - start` in days, plus one. Returns 0 when `end` precedes `start`.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days();
    if days < 0 { 0 } else { days as u32 + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_inclusive_day_count() {
        assert_eq!(inclusive_day_count(date("2025-01-01"), date("2025-01-05")), 5);
        assert_eq!(inclusive_day_count(date("2025-01-01"), date("2025-01-01")), 1);
        assert_eq!(inclusive_day_count(date("2025-01-05"), date("2025-01-01")), 0);
    }

    #[test]
    fn test_period_rejects_reversed_dates() {
        assert!(matches!(
            PolicyPeriod::new(date("2025-02-01"), date("2025-01-31")),
            Err(OrderError::ValidationError(_))
        ));
    }

    #[test]
    fn test_month_periods_do_not_overlap() {
        let first = PolicyPeriod::of_months(date("2025-01-15"), 3).unwrap();
        assert_eq!(first.end(), date("2025-04-14"));

        let next = PolicyPeriod::of_months(date("2025-04-15"), 3).unwrap();
        assert!(next.start() > first.end());

        let year = PolicyPeriod::of_months(date("2024-03-01"), 12).unwrap();
        assert_eq!(year.end(), date("2025-02-28"));
        assert_eq!(year.number_of_days(), 365);
    }

    #[test]
    fn test_period_deserialization_is_validated() {
        let ok: PolicyPeriod =
            serde_json::from_str(r#"{"start":"2025-01-01","end":"2025-01-05"}"#).unwrap();
        assert_eq!(ok.number_of_days(), 5);

        let bad = serde_json::from_str::<PolicyPeriod>(r#"{"start":"2025-01-05","end":"2025-01-01"}"#);
        assert!(bad.is_err());
    }
}
