//! Accounting periods: calendar months keyed by their first day.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use monthwise_core::{DomainError, DomainResult, ValueObject};
use monthwise_invoicing::InvoiceSnapshot;

/// A calendar month (UTC), represented by its first day.
///
/// Two periods are equal iff they share year and month; the inner date is
/// always normalized to day 1, so derived equality and ordering are exactly
/// the year+month semantics. Used as the natural key for revenue aggregates.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Period(NaiveDate);

impl Period {
    /// Period containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so the fallback never triggers.
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Period for an explicit year and month.
    pub fn from_ym(year: i32, month: u32) -> DomainResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("invalid period {year}-{month:02}")))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// UTC midnight at the start of the month.
    pub fn start(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }
}

impl ValueObject for Period {}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Sane-year bounds for resolved periods.
///
/// Guards against corrupted input (a typo'd year in a form field) producing
/// bogus aggregate rows far in the past or future.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PeriodBounds {
    pub min_year: i32,
    pub max_years_ahead: i32,
}

impl Default for PeriodBounds {
    fn default() -> Self {
        Self {
            min_year: 2000,
            max_years_ahead: 5,
        }
    }
}

impl PeriodBounds {
    fn contains(&self, year: i32) -> bool {
        year >= self.min_year && year <= Utc::now().year() + self.max_years_ahead
    }
}

/// Extracts and validates the accounting period from an invoice snapshot.
///
/// Never fails loudly: a malformed date or an out-of-bounds year resolves to
/// `None`, and the caller logs and skips the event.
#[derive(Debug, Copy, Clone, Default)]
pub struct PeriodResolver {
    bounds: PeriodBounds,
}

impl PeriodResolver {
    pub fn new(bounds: PeriodBounds) -> Self {
        Self { bounds }
    }

    pub fn resolve(&self, invoice: &InvoiceSnapshot) -> Option<Period> {
        let date = parse_calendar_date(&invoice.date)?;
        let period = Period::from_date(date);
        self.bounds.contains(period.year()).then_some(period)
    }
}

/// Parse the date string captured at the web boundary.
///
/// The form layer has historically sent both plain calendar dates and full
/// RFC 3339 timestamps; accept either, normalized to UTC.
fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use monthwise_core::{CustomerId, InvoiceId};
    use monthwise_invoicing::InvoiceStatus;

    fn invoice_dated(date: &str) -> InvoiceSnapshot {
        InvoiceSnapshot::new(
            InvoiceId::new(),
            CustomerId::new(),
            10_000,
            InvoiceStatus::Paid,
            date,
        )
    }

    #[test]
    fn periods_are_equal_iff_same_year_and_month() {
        let a = Period::from_date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        let b = Period::from_date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        let c = Period::from_date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.first_day().day0(), 0);
    }

    #[test]
    fn period_start_is_utc_midnight() {
        let period = Period::from_ym(2024, 3).unwrap();
        assert_eq!(period.start().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(period.to_string(), "2024-03");
    }

    #[test]
    fn period_serializes_as_its_first_day() {
        let period = Period::from_ym(2024, 3).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2024-03-01\"");
        assert_eq!(serde_json::from_str::<Period>(&json).unwrap(), period);
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(Period::from_ym(2024, 13).is_err());
        assert!(Period::from_ym(2024, 0).is_err());
    }

    #[test]
    fn resolves_plain_calendar_dates() {
        let resolver = PeriodResolver::default();
        let period = resolver.resolve(&invoice_dated("2024-03-12")).unwrap();
        assert_eq!((period.year(), period.month()), (2024, 3));
    }

    #[test]
    fn resolves_rfc3339_timestamps() {
        let resolver = PeriodResolver::default();
        let period = resolver
            .resolve(&invoice_dated("2024-03-12T15:30:00+02:00"))
            .unwrap();
        assert_eq!((period.year(), period.month()), (2024, 3));
    }

    #[test]
    fn malformed_date_resolves_to_none() {
        let resolver = PeriodResolver::default();
        assert_eq!(resolver.resolve(&invoice_dated("12/03/2024")), None);
        assert_eq!(resolver.resolve(&invoice_dated("")), None);
        assert_eq!(resolver.resolve(&invoice_dated("2024-02-30")), None);
    }

    #[test]
    fn out_of_bounds_years_resolve_to_none() {
        let resolver = PeriodResolver::default();
        assert_eq!(resolver.resolve(&invoice_dated("1999-12-31")), None);
        assert_eq!(resolver.resolve(&invoice_dated("2099-01-01")), None);
    }

    #[test]
    fn bounds_are_configurable() {
        let resolver = PeriodResolver::new(PeriodBounds {
            min_year: 1990,
            max_years_ahead: 100,
        });
        assert!(resolver.resolve(&invoice_dated("1999-12-31")).is_some());
        assert!(resolver.resolve(&invoice_dated("2099-01-01")).is_some());
    }
}
