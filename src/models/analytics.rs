use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::appointment::AppointmentStatus;
use super::business::{BusinessId, ServiceId};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceStats {
    pub service_id: ServiceId,
    pub service_name: String,
    pub booking_count: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSummary {
    pub business_id: BusinessId,
    pub business_name: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub appointments_today: usize,
    pub total_in_period: usize,
    pub new_bookings: usize,
    pub cancelled: usize,
    pub revenue: Decimal,
    pub daily_revenue: BTreeMap<NaiveDate, Decimal>,
    pub by_status: BTreeMap<AppointmentStatus, usize>,
    pub top_services: Vec<ServiceStats>,
    pub total_customers: usize,
    pub new_customers: usize,
    pub returning_customers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for WindowKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(WindowKind::Daily),
            "weekly" => Ok(WindowKind::Weekly),
            "monthly" => Ok(WindowKind::Monthly),
            "yearly" => Ok(WindowKind::Yearly),
            other => Err(AppError::Validation(format!("unknown window: {other}"))),
        }
    }
}

/// Longest explicit window, one leap year.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Closed date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::Validation(format!(
                "window start {start} is after window end {end}"
            )));
        }
        let span = (end - start).num_days() + 1;
        if span > MAX_WINDOW_DAYS {
            return Err(AppError::Validation(format!(
                "window spans {span} days, at most {MAX_WINDOW_DAYS} allowed"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// The canned window of `kind` that contains `today`.
    pub fn containing(kind: WindowKind, today: NaiveDate) -> Self {
        match kind {
            WindowKind::Daily => Self::day(today),
            WindowKind::Weekly => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Self { start, end: start + Duration::days(6) }
            }
            WindowKind::Monthly => {
                let start = today.with_day(1).unwrap_or(today);
                let next_month = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                let end = next_month
                    .and_then(|d| d.pred_opt())
                    .unwrap_or(today);
                Self { start, end }
            }
            WindowKind::Yearly => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                Self { start, end }
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
