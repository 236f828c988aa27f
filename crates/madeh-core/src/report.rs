//! # Sales Reports
//!
//! Read-only aggregation over paid purchases.
//!
//! ```text
//! purchases ──► Paid only ──► date bucket ──► payment method ──► sum / count / average
//!                              all | today      all | one
//!                              | this_month
//! ```
//!
//! Buckets are evaluated against local midnight and the first of the current
//! month in the caller's time zone. The clock is a parameter so the
//! aggregation stays pure.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Purchase};

/// Date range of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    #[default]
    All,
    Today,
    ThisMonth,
}

/// Report filter. `method: None` (or `all` on the wire) means every payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportFilter {
    #[serde(default)]
    pub period: DateBucket,
    #[serde(default, deserialize_with = "method_or_all")]
    pub method: Option<PaymentMethod>,
}

fn method_or_all<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PaymentMethod>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Aggregated report over the filtered set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub filter: ReportFilter,
    pub total_cents: i64,
    pub count: usize,
    /// Rounded to the nearest cent, 0 when `count` is 0.
    pub average_cents: i64,
    pub purchases: Vec<Purchase>,
}

impl DateBucket {
    /// Inclusive lower bound of the bucket, `None` for all-time.
    pub fn start<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let first = match self {
            DateBucket::All => return None,
            DateBucket::Today => today,
            DateBucket::ThisMonth => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?,
        };
        let midnight = first.and_hms_opt(0, 0, 0)?;
        let local = now
            .timezone()
            .from_local_datetime(&midnight)
            .earliest()
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
        Some(local)
    }
}

impl ReportFilter {
    /// Whether a purchase belongs in the report at time `now`.
    pub fn matches<Tz: TimeZone>(&self, purchase: &Purchase, now: &DateTime<Tz>) -> bool {
        if !purchase.is_paid() {
            return false;
        }
        if let Some(method) = self.method {
            if purchase.payment_method != method {
                return false;
            }
        }
        match self.period.start(now) {
            Some(start) => purchase.created_at >= start,
            None => true,
        }
    }
}

/// Filters and aggregates purchases.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use madeh_core::report::{summarize, ReportFilter};
///
/// let report = summarize(Vec::new(), ReportFilter::default(), &Utc::now());
/// assert_eq!(report.count, 0);
/// assert_eq!(report.average_cents, 0);
/// ```
pub fn summarize<Tz: TimeZone>(
    purchases: Vec<Purchase>,
    filter: ReportFilter,
    now: &DateTime<Tz>,
) -> SalesReport {
    let purchases: Vec<Purchase> = purchases
        .into_iter()
        .filter(|p| filter.matches(p, now))
        .collect();

    let total: Money = purchases.iter().map(Purchase::total).sum();
    let count = purchases.len();

    SalesReport {
        filter,
        total_cents: total.cents(),
        count,
        average_cents: total.average_over(count).cents(),
        purchases,
    }
}

/// Renders report rows as CSV: Purchase ID, Date, Total Amount, Payment Method, Payment Status.
///
/// Dates are `dd/mm/yyyy` in the time zone `tz`.
pub fn export_csv<Tz>(purchases: &[Purchase], tz: &Tz) -> CoreResult<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Purchase ID", "Date", "Total Amount", "Payment Method", "Payment Status"])
        .map_err(|e| CoreError::Csv(e.to_string()))?;

    for purchase in purchases {
        let date = purchase.created_at.with_timezone(tz).format("%d/%m/%Y").to_string();
        let total = purchase.total().to_string();
        let method = purchase.payment_method.to_string();
        let status = purchase.payment_status.to_string();
        writer
            .write_record([purchase.id.as_str(), &date, &total, &method, &status])
            .map_err(|e| CoreError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Csv(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
