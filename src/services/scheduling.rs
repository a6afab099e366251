//! Slot generation and conflict filtering.
//!
//! Candidate start times walk a fixed 30-minute grid from opening time,
//! whatever the service length. A slot may end exactly at closing time.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::db::{AppointmentFilter, CalendarStore};
use crate::errors::AppError;
use crate::models::clock::format_time;
use crate::models::{Appointment, BusinessId, ServiceId};

pub const SLOT_STRIDE_MINUTES: i64 = 30;

/// End of a slot starting at `start`, or `None` if it would run past midnight.
pub fn slot_end(start: NaiveTime, duration: Duration) -> Option<NaiveTime> {
    let (end, overflow) = start.overflowing_add_signed(duration);
    (overflow == 0).then_some(end)
}

/// Ordered, finite grid of candidate start times. Clone it to restart.
#[derive(Debug, Clone)]
pub struct CandidateSlots {
    next: Option<NaiveTime>,
    close: NaiveTime,
    duration: Duration,
}

impl Iterator for CandidateSlots {
    type Item = NaiveTime;

    fn next(&mut self) -> Option<NaiveTime> {
        let current = self.next?;

        let fits = slot_end(current, self.duration).is_some_and(|end| end <= self.close);
        if !fits {
            self.next = None;
            return None;
        }

        self.next = slot_end(current, Duration::minutes(SLOT_STRIDE_MINUTES));
        Some(current)
    }
}

pub fn generate_candidate_slots(
    open: NaiveTime,
    close: NaiveTime,
    duration_minutes: i32,
) -> CandidateSlots {
    CandidateSlots {
        next: Some(open),
        close,
        duration: Duration::minutes(duration_minutes as i64),
    }
}

/// Keeps the candidates whose `[start, start + duration)` overlaps no
/// non-cancelled appointment. Candidate order is preserved.
pub fn filter_available<I>(
    candidates: I,
    existing: &[Appointment],
    duration_minutes: i32,
) -> Vec<NaiveTime>
where
    I: IntoIterator<Item = NaiveTime>,
{
    let duration = Duration::minutes(duration_minutes as i64);
    let blocking: Vec<&Appointment> = existing.iter().filter(|a| a.blocks_calendar()).collect();

    candidates
        .into_iter()
        .filter(|start| match slot_end(*start, duration) {
            Some(end) => !blocking.iter().any(|a| a.overlaps(*start, end)),
            None => false,
        })
        .collect()
}

/// First non-cancelled appointment overlapping `[start, end)`, skipping
/// the appointment with id `exclude`.
pub fn first_conflict<'a>(
    existing: &'a [Appointment],
    start: NaiveTime,
    end: NaiveTime,
    exclude: Option<&str>,
) -> Option<&'a Appointment> {
    existing
        .iter()
        .filter(|a| a.blocks_calendar())
        .filter(|a| exclude != Some(a.id.as_str()))
        .find(|a| a.overlaps(start, end))
}

/// Bookable `HH:MM` start times for a service on a date.
///
/// Fails with `NotFound` when the business, the service, or the weekday's
/// hours record is missing; a day marked closed yields an empty list.
pub fn available_time_slots<S>(
    store: &S,
    business_id: BusinessId,
    service_id: ServiceId,
    date: NaiveDate,
) -> Result<Vec<String>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = store
        .find_business(business_id)?
        .ok_or_else(|| AppError::not_found("business", business_id))?;
    let service = store
        .find_service(service_id)?
        .ok_or_else(|| AppError::not_found("service", service_id))?;

    if service.duration_minutes <= 0 {
        return Err(AppError::Validation(format!(
            "service {} has non-positive duration {}",
            service.id, service.duration_minutes
        )));
    }

    let weekday = date.weekday();
    let hours = store
        .find_business_hours(business.id, weekday)?
        .ok_or_else(|| {
            AppError::NotFound(format!("business hours for business {} on {weekday}", business.id))
        })?;

    if !hours.is_open {
        return Ok(vec![]);
    }

    let existing = store.find_appointments(&AppointmentFilter::for_business(business.id).on(date))?;

    let candidates = generate_candidate_slots(hours.open_time, hours.close_time, service.duration_minutes);
    let available = filter_available(candidates, &existing, service.duration_minutes);

    tracing::debug!(
        business_id = business.id,
        service_id = service.id,
        %date,
        available = available.len(),
        "computed available slots"
    );

    Ok(available.into_iter().map(format_time).collect())
}
