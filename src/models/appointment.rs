use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::business::{BusinessId, CustomerId, ServiceId};
use super::clock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub customer_id: CustomerId,
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    #[serde(with = "clock::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "clock::hhmm")]
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    #[serde(with = "clock::timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "clock::timestamp_opt")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(with = "clock::timestamp_opt")]
    pub cancelled_at: Option<NaiveDateTime>,
}

impl Appointment {
    /// Whether this appointment occupies its time range.
    pub fn blocks_calendar(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// Half-open overlap of `[start, end)` with this appointment.
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end_time && end > self.start_time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    /// Statuses whose price counts as earned revenue.
    pub fn is_revenue(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Which status changes `update_status` and `cancel` accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any target from any source.
    #[default]
    Permissive,
    /// Pending -> confirmed/cancelled, confirmed -> completed/cancelled,
    /// plus self-transitions.
    Strict,
}

impl TransitionPolicy {
    pub fn permits(self, from: AppointmentStatus, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;

        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Confirmed)
                            | (Pending, Cancelled)
                            | (Confirmed, Completed)
                            | (Confirmed, Cancelled)
                    )
            }
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

/// Input to `create_appointment`.
#[derive(Debug, Clone)]
pub struct CreateAppointmentRequest {
    pub customer_id: CustomerId,
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}
