use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::clock;
use crate::errors::AppError;

pub type BusinessId = i64;
pub type CustomerId = i64;
pub type ServiceId = i64;
pub type BusinessHoursId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A bookable offering. Price and duration are copied into each
/// appointment at booking time, so edits here never touch history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub business_id: BusinessId,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub active: bool,
}

/// Operating hours of one business for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessHours {
    pub id: BusinessHoursId,
    pub business_id: BusinessId,
    pub day_of_week: Weekday,
    #[serde(with = "clock::hhmm")]
    pub open_time: NaiveTime,
    #[serde(with = "clock::hhmm")]
    pub close_time: NaiveTime,
    pub is_open: bool,
}

#[derive(Debug, Clone)]
pub struct NewBusinessHours {
    pub business_id: BusinessId,
    pub day_of_week: Weekday,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open: bool,
}

/// Replacement values for an existing hours record.
#[derive(Debug, Clone)]
pub struct BusinessHoursUpdate {
    pub day_of_week: Weekday,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open: bool,
}

/// Weekday as stored: Monday = 1 … Sunday = 7.
pub fn weekday_number(day: Weekday) -> u32 {
    day.number_from_monday()
}

pub fn weekday_from_number(n: u32) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Accepts `1`-`7` (Monday first) or an English day name such as `mon` or `MONDAY`.
pub fn parse_weekday(s: &str) -> Result<Weekday, AppError> {
    let s = s.trim();
    let parsed = match s.parse::<u32>() {
        Ok(n) => weekday_from_number(n),
        Err(_) => s.parse::<Weekday>().ok(),
    };
    parsed.ok_or_else(|| AppError::Validation(format!("invalid day of week '{s}'")))
}
