//! Business hours management. One record per business per weekday.

use chrono::{NaiveTime, Weekday};

use crate::db::CalendarStore;
use crate::errors::AppError;
use crate::models::clock::format_time;
use crate::models::{BusinessHours, BusinessHoursId, BusinessHoursUpdate, BusinessId, NewBusinessHours};

fn validate_times(open: NaiveTime, close: NaiveTime, is_open: bool) -> Result<(), AppError> {
    if is_open && open >= close {
        return Err(AppError::Validation(format!(
            "open time {} must be before close time {}",
            format_time(open),
            format_time(close)
        )));
    }
    Ok(())
}

fn day_taken(business_id: BusinessId, day: Weekday) -> AppError {
    AppError::Conflict(format!(
        "business {business_id} already has hours for {day}"
    ))
}

pub fn create_business_hours<S>(store: &S, new: &NewBusinessHours) -> Result<BusinessHours, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = store
        .find_business(new.business_id)?
        .ok_or_else(|| AppError::not_found("business", new.business_id))?;

    validate_times(new.open_time, new.close_time, new.is_open)?;

    if store.find_business_hours(business.id, new.day_of_week)?.is_some() {
        return Err(day_taken(business.id, new.day_of_week));
    }

    let hours = store.insert_business_hours(new)?;
    tracing::info!(
        business_hours_id = hours.id,
        business_id = business.id,
        day = %hours.day_of_week,
        "business hours created"
    );
    Ok(hours)
}

pub fn get_business_hours<S>(store: &S, id: BusinessHoursId) -> Result<BusinessHours, AppError>
where
    S: CalendarStore + ?Sized,
{
    store
        .find_business_hours_by_id(id)?
        .ok_or_else(|| AppError::not_found("business hours", id))
}

/// All hours records of a business, Monday first.
pub fn business_hours_for<S>(store: &S, business_id: BusinessId) -> Result<Vec<BusinessHours>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = store
        .find_business(business_id)?
        .ok_or_else(|| AppError::not_found("business", business_id))?;
    Ok(store.list_business_hours(business.id)?)
}

pub fn business_hours_for_day<S>(
    store: &S,
    business_id: BusinessId,
    day: Weekday,
) -> Result<BusinessHours, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = store
        .find_business(business_id)?
        .ok_or_else(|| AppError::not_found("business", business_id))?;
    store
        .find_business_hours(business.id, day)?
        .ok_or_else(|| AppError::NotFound(format!("business hours for business {business_id} on {day}")))
}

pub fn update_business_hours<S>(
    store: &S,
    id: BusinessHoursId,
    update: &BusinessHoursUpdate,
) -> Result<BusinessHours, AppError>
where
    S: CalendarStore + ?Sized,
{
    let mut hours = get_business_hours(store, id)?;
    validate_times(update.open_time, update.close_time, update.is_open)?;

    if update.day_of_week != hours.day_of_week
        && store
            .find_business_hours(hours.business_id, update.day_of_week)?
            .is_some()
    {
        return Err(day_taken(hours.business_id, update.day_of_week));
    }

    hours.day_of_week = update.day_of_week;
    hours.open_time = update.open_time;
    hours.close_time = update.close_time;
    hours.is_open = update.is_open;
    store.update_business_hours(&hours)?;

    tracing::info!(business_hours_id = hours.id, day = %hours.day_of_week, "business hours updated");
    Ok(hours)
}

pub fn set_business_hours_open<S>(
    store: &S,
    id: BusinessHoursId,
    is_open: bool,
) -> Result<BusinessHours, AppError>
where
    S: CalendarStore + ?Sized,
{
    let mut hours = get_business_hours(store, id)?;
    if is_open {
        validate_times(hours.open_time, hours.close_time, true)?;
    }

    hours.is_open = is_open;
    store.update_business_hours(&hours)?;

    tracing::info!(business_hours_id = hours.id, is_open, "business hours toggled");
    Ok(hours)
}

pub fn delete_business_hours<S>(store: &S, id: BusinessHoursId) -> Result<(), AppError>
where
    S: CalendarStore + ?Sized,
{
    if !store.delete_business_hours(id)? {
        return Err(AppError::not_found("business hours", id));
    }

    tracing::info!(business_hours_id = id, "business hours deleted");
    Ok(())
}
