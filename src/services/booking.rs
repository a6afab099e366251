//! Appointment lifecycle: create, status changes, cancel, reschedule, delete,
//! plus the read-side appointment queries.
//!
//! Callers hold the store lock for the whole call, so each operation's
//! read, conflict re-check, and write happen without interleaving.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::db::{self, AppointmentFilter, CalendarStore};
use crate::errors::AppError;
use crate::models::clock::{format_time, parse_time};
use crate::models::{
    Appointment, AppointmentStatus, Business, BusinessId, CreateAppointmentRequest, Customer,
    CustomerId, TransitionPolicy,
};
use crate::services::scheduling::{first_conflict, slot_end};

/// A write that trips the active-slot index lost a race with another booking.
fn slot_taken(err: anyhow::Error) -> AppError {
    if db::is_unique_violation(&err) {
        tracing::warn!(error = %err, "booking rejected by the active-slot index");
        return AppError::Conflict("time slot is already booked".to_string());
    }
    AppError::Storage(err)
}

// ── Lookups ──

fn require_customer<S>(store: &S, id: CustomerId) -> Result<Customer, AppError>
where
    S: CalendarStore + ?Sized,
{
    store
        .find_customer(id)?
        .ok_or_else(|| AppError::not_found("customer", id))
}

fn require_business<S>(store: &S, id: BusinessId) -> Result<Business, AppError>
where
    S: CalendarStore + ?Sized,
{
    store
        .find_business(id)?
        .ok_or_else(|| AppError::not_found("business", id))
}

fn end_time_for(start: NaiveTime, duration_minutes: i32) -> Result<NaiveTime, AppError> {
    if duration_minutes <= 0 {
        return Err(AppError::Validation(format!(
            "duration must be positive, got {duration_minutes} minutes"
        )));
    }

    slot_end(start, Duration::minutes(duration_minutes as i64)).ok_or_else(|| {
        AppError::Validation(format!(
            "appointment at {} for {duration_minutes} minutes runs past midnight",
            format_time(start)
        ))
    })
}

fn require_future(date: NaiveDate, now: NaiveDateTime) -> Result<(), AppError> {
    if date <= now.date() {
        return Err(AppError::Validation(format!(
            "appointment date {date} must be after {}",
            now.date()
        )));
    }
    Ok(())
}

fn ensure_slot_free<S>(
    store: &S,
    business_id: BusinessId,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    exclude: Option<&str>,
) -> Result<(), AppError>
where
    S: CalendarStore + ?Sized,
{
    let existing = store.find_appointments(&AppointmentFilter::for_business(business_id).on(date))?;

    if let Some(clash) = first_conflict(&existing, start, end, exclude) {
        tracing::warn!(
            business_id,
            %date,
            conflicting_id = %clash.id,
            "rejected overlapping booking"
        );
        return Err(AppError::Conflict(format!(
            "{date} {}-{} overlaps appointment {} ({}-{})",
            format_time(start),
            format_time(end),
            clash.id,
            format_time(clash.start_time),
            format_time(clash.end_time),
        )));
    }

    Ok(())
}

fn check_transition(
    policy: TransitionPolicy,
    appointment: &Appointment,
    target: AppointmentStatus,
) -> Result<(), AppError> {
    if policy.permits(appointment.status, target) {
        return Ok(());
    }

    tracing::warn!(
        appointment_id = %appointment.id,
        from = %appointment.status,
        to = %target,
        "rejected status transition"
    );
    Err(AppError::Conflict(format!(
        "appointment {} cannot move from {} to {}",
        appointment.id, appointment.status, target
    )))
}

// ── Writes ──

/// Books a new `pending` appointment. The price is copied from the service.
pub fn create_appointment<S>(
    store: &S,
    req: &CreateAppointmentRequest,
    now: NaiveDateTime,
) -> Result<Appointment, AppError>
where
    S: CalendarStore + ?Sized,
{
    require_future(req.date, now)?;
    let end_time = end_time_for(req.start_time, req.duration_minutes)?;

    let customer = require_customer(store, req.customer_id)?;
    let business = require_business(store, req.business_id)?;
    let service = store
        .find_service(req.service_id)?
        .ok_or_else(|| AppError::not_found("service", req.service_id))?;

    ensure_slot_free(store, business.id, req.date, req.start_time, end_time, None)?;

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id,
        business_id: business.id,
        service_id: service.id,
        date: req.date,
        start_time: req.start_time,
        end_time,
        duration_minutes: req.duration_minutes,
        price: service.price,
        status: AppointmentStatus::Pending,
        notes: req.notes.clone(),
        cancellation_reason: None,
        created_at: now,
        updated_at: None,
        cancelled_at: None,
    };

    store.insert_appointment(&appointment).map_err(slot_taken)?;

    tracing::info!(
        appointment_id = %appointment.id,
        business_id = business.id,
        customer_id = customer.id,
        date = %appointment.date,
        start = %format_time(appointment.start_time),
        "appointment created"
    );

    Ok(appointment)
}

pub fn update_status<S>(
    store: &S,
    id: &str,
    target: AppointmentStatus,
    policy: TransitionPolicy,
    now: NaiveDateTime,
) -> Result<Appointment, AppError>
where
    S: CalendarStore + ?Sized,
{
    let mut appointment = get_appointment(store, id)?;
    check_transition(policy, &appointment, target)?;

    // Reactivating a cancelled booking must not land on top of a newer one.
    if !appointment.blocks_calendar() && target != AppointmentStatus::Cancelled {
        ensure_slot_free(
            store,
            appointment.business_id,
            appointment.date,
            appointment.start_time,
            appointment.end_time,
            Some(&appointment.id),
        )?;
    }

    let previous = appointment.status;
    if target == AppointmentStatus::Cancelled {
        if previous != AppointmentStatus::Cancelled {
            appointment.cancelled_at = Some(now);
        }
    } else {
        appointment.cancelled_at = None;
        appointment.cancellation_reason = None;
    }
    appointment.status = target;
    appointment.updated_at = Some(now);
    store.update_appointment(&appointment).map_err(slot_taken)?;

    tracing::info!(
        appointment_id = %appointment.id,
        from = %previous,
        to = %target,
        "appointment status updated"
    );

    Ok(appointment)
}

/// Cancels an appointment. Cancelling twice overwrites the reason and timestamp.
pub fn cancel_appointment<S>(
    store: &S,
    id: &str,
    reason: Option<String>,
    policy: TransitionPolicy,
    now: NaiveDateTime,
) -> Result<Appointment, AppError>
where
    S: CalendarStore + ?Sized,
{
    let mut appointment = get_appointment(store, id)?;
    check_transition(policy, &appointment, AppointmentStatus::Cancelled)?;

    appointment.status = AppointmentStatus::Cancelled;
    appointment.cancellation_reason = reason;
    appointment.cancelled_at = Some(now);
    appointment.updated_at = Some(now);
    store.update_appointment(&appointment).map_err(slot_taken)?;

    tracing::info!(appointment_id = %appointment.id, "appointment cancelled");

    Ok(appointment)
}

/// Moves an appointment to a new date and start time, keeping its duration.
pub fn reschedule_appointment<S>(
    store: &S,
    id: &str,
    new_date: NaiveDate,
    new_start: &str,
    now: NaiveDateTime,
) -> Result<Appointment, AppError>
where
    S: CalendarStore + ?Sized,
{
    let start_time = parse_time(new_start)?;
    let mut appointment = get_appointment(store, id)?;

    require_future(new_date, now)?;
    let end_time = end_time_for(start_time, appointment.duration_minutes)?;

    if appointment.blocks_calendar() {
        ensure_slot_free(
            store,
            appointment.business_id,
            new_date,
            start_time,
            end_time,
            Some(&appointment.id),
        )?;
    }

    let previous_date = appointment.date;
    let previous_start = appointment.start_time;

    appointment.date = new_date;
    appointment.start_time = start_time;
    appointment.end_time = end_time;
    appointment.updated_at = Some(now);
    store.update_appointment(&appointment).map_err(slot_taken)?;

    tracing::info!(
        appointment_id = %appointment.id,
        from = %format!("{previous_date} {}", format_time(previous_start)),
        to = %format!("{new_date} {}", format_time(start_time)),
        "appointment rescheduled"
    );

    Ok(appointment)
}

pub fn delete_appointment<S>(store: &S, id: &str) -> Result<(), AppError>
where
    S: CalendarStore + ?Sized,
{
    if !store.delete_appointment(id)? {
        return Err(AppError::not_found("appointment", id));
    }

    tracing::info!(appointment_id = %id, "appointment deleted");
    Ok(())
}

// ── Queries ──

pub fn get_appointment<S>(store: &S, id: &str) -> Result<Appointment, AppError>
where
    S: CalendarStore + ?Sized,
{
    store
        .find_appointment(id)?
        .ok_or_else(|| AppError::not_found("appointment", id))
}

pub fn appointments_for_customer<S>(
    store: &S,
    customer_id: CustomerId,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let customer = require_customer(store, customer_id)?;
    let mut filter = AppointmentFilter::for_customer(customer.id);
    filter.status = status;
    Ok(store.find_appointments(&filter)?)
}

pub fn appointments_for_business<S>(
    store: &S,
    business_id: BusinessId,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = require_business(store, business_id)?;
    let mut filter = AppointmentFilter::for_business(business.id);
    filter.status = status;
    Ok(store.find_appointments(&filter)?)
}

pub fn appointments_for_business_on<S>(
    store: &S,
    business_id: BusinessId,
    date: NaiveDate,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = require_business(store, business_id)?;
    Ok(store.find_appointments(&AppointmentFilter::for_business(business.id).on(date))?)
}

pub fn appointments_by_status<S>(
    store: &S,
    status: AppointmentStatus,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    Ok(store.find_appointments(&AppointmentFilter::default().with_status(status))?)
}

pub fn appointments_on_date<S>(store: &S, date: NaiveDate) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    Ok(store.find_appointments(&AppointmentFilter::default().on(date))?)
}

/// Appointments dated today or later, soonest first.
pub fn upcoming_for_customer<S>(
    store: &S,
    customer_id: CustomerId,
    today: NaiveDate,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let customer = require_customer(store, customer_id)?;
    Ok(store.find_appointments(&AppointmentFilter::for_customer(customer.id).starting_from(today))?)
}

/// Appointments dated before today, most recent first.
pub fn past_for_customer<S>(
    store: &S,
    customer_id: CustomerId,
    today: NaiveDate,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let customer = require_customer(store, customer_id)?;
    Ok(store.find_appointments(
        &AppointmentFilter::for_customer(customer.id)
            .before(today)
            .descending(),
    )?)
}

pub fn upcoming_for_business<S>(
    store: &S,
    business_id: BusinessId,
    today: NaiveDate,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = require_business(store, business_id)?;
    Ok(store.find_appointments(&AppointmentFilter::for_business(business.id).starting_from(today))?)
}

pub fn past_for_business<S>(
    store: &S,
    business_id: BusinessId,
    today: NaiveDate,
) -> Result<Vec<Appointment>, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = require_business(store, business_id)?;
    Ok(store.find_appointments(
        &AppointmentFilter::for_business(business.id)
            .before(today)
            .descending(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, queries};
    use crate::models::ServiceId;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    struct Fixture {
        conn: Connection,
        business: BusinessId,
        customer: CustomerId,
        service: ServiceId,
    }

    fn fixture() -> Fixture {
        let conn = db::init_db(":memory:").unwrap();
        let business = queries::insert_business(&conn, "Corner Barber", None, true).unwrap();
        let customer = queries::insert_customer(&conn, "Ada", "Lovelace", "ada@example.com").unwrap();
        let service = queries::insert_service(&conn, business, "Cut", 60, dec!(25.00), true).unwrap();
        Fixture { conn, business, customer, service }
    }

    fn now() -> NaiveDateTime {
        dt("2030-01-01 10:00:00")
    }

    fn request(f: &Fixture, day: &str, start: &str, minutes: i32) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            customer_id: f.customer,
            business_id: f.business,
            service_id: f.service,
            date: date(day),
            start_time: t(start),
            duration_minutes: minutes,
            notes: Some("first visit".to_string()),
        }
    }

    fn count_all(f: &Fixture) -> usize {
        queries::find_appointments(&f.conn, &AppointmentFilter::default())
            .unwrap()
            .len()
    }

    #[test]
    fn test_create_snapshots_price_and_derives_end() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 90), now()).unwrap();

        assert_eq!(created.status, AppointmentStatus::Pending);
        assert_eq!(created.price, dec!(25.00));
        assert_eq!(created.end_time, t("11:30"));
        assert_eq!(created.duration_minutes, 90);
        assert_eq!(created.created_at, now());
        assert!(Uuid::parse_str(&created.id).is_ok());

        let stored = get_appointment(&f.conn, &created.id).unwrap();
        assert_eq!(stored, created);
    }

    #[test]
    fn test_create_with_unknown_service_persists_nothing() {
        let f = fixture();
        let mut req = request(&f, "2030-01-07", "10:00", 60);
        req.service_id = f.service + 100;

        let result = create_appointment(&f.conn, &req, now());
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(count_all(&f), 0);
    }

    #[test]
    fn test_create_with_unknown_customer_or_business() {
        let f = fixture();
        let mut req = request(&f, "2030-01-07", "10:00", 60);
        req.customer_id = f.customer + 100;
        assert!(matches!(create_appointment(&f.conn, &req, now()), Err(AppError::NotFound(_))));

        let mut req = request(&f, "2030-01-07", "10:00", 60);
        req.business_id = f.business + 100;
        assert!(matches!(create_appointment(&f.conn, &req, now()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_create_requires_future_date() {
        let f = fixture();
        for day in ["2029-12-31", "2030-01-01"] {
            let result = create_appointment(&f.conn, &request(&f, day, "10:00", 60), now());
            assert!(matches!(result, Err(AppError::Validation(_))), "{day}");
        }
        assert_eq!(count_all(&f), 0);
    }

    #[test]
    fn test_create_rejects_bad_durations() {
        let f = fixture();
        for minutes in [0, -30] {
            let result = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", minutes), now());
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        let result = create_appointment(&f.conn, &request(&f, "2030-01-07", "23:30", 60), now());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_overlap_but_allows_adjacent() {
        let f = fixture();
        create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let clash = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:30", 60), now());
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        create_appointment(&f.conn, &request(&f, "2030-01-07", "11:00", 60), now()).unwrap();
        create_appointment(&f.conn, &request(&f, "2030-01-08", "10:30", 60), now()).unwrap();
        assert_eq!(count_all(&f), 3);
    }

    #[test]
    fn test_active_slot_index_violation_is_a_conflict() {
        let f = fixture();
        let first = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        // A second writer that skipped the overlap check
        let mut racer = first.clone();
        racer.id = Uuid::new_v4().to_string();
        let err = queries::create_appointment(&f.conn, &racer).unwrap_err();
        assert!(matches!(slot_taken(err), AppError::Conflict(_)));

        // Reusing an id is a different constraint and stays a storage error
        let mut duplicate = first.clone();
        duplicate.start_time = t("14:00");
        let err = queries::create_appointment(&f.conn, &duplicate).unwrap_err();
        assert!(matches!(slot_taken(err), AppError::Storage(_)));
        assert_eq!(count_all(&f), 1);
    }

    #[test]
    fn test_cancelled_slot_can_be_booked_again() {
        let f = fixture();
        let first = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        cancel_appointment(&f.conn, &first.id, None, TransitionPolicy::Permissive, now()).unwrap();

        let second = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_service_price_change_is_not_retroactive() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let mut service = queries::get_service(&f.conn, f.service).unwrap().unwrap();
        service.price = dec!(99.99);
        service.duration_minutes = 15;
        queries::update_service(&f.conn, &service).unwrap();

        let stored = get_appointment(&f.conn, &created.id).unwrap();
        assert_eq!(stored.price, dec!(25.00));
        assert_eq!(stored.duration_minutes, 60);
        assert_eq!(stored.end_time, t("11:00"));
    }

    #[test]
    fn test_update_status_permissive_overwrites() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        let later = dt("2030-01-02 08:00:00");

        let completed = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Completed,
            TransitionPolicy::Permissive,
            later,
        )
        .unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);
        assert_eq!(completed.updated_at, Some(later));

        let back = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Pending,
            TransitionPolicy::Permissive,
            later,
        )
        .unwrap();
        assert_eq!(back.status, AppointmentStatus::Pending);
    }

    #[test]
    fn test_update_status_strict_rejects_unlisted_transition() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let result = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Completed,
            TransitionPolicy::Strict,
            now(),
        );
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(
            get_appointment(&f.conn, &created.id).unwrap().status,
            AppointmentStatus::Pending
        );

        let confirmed = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Confirmed,
            TransitionPolicy::Strict,
            now(),
        )
        .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn test_reactivating_over_newer_booking_conflicts() {
        let f = fixture();
        let old = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        cancel_appointment(&f.conn, &old.id, None, TransitionPolicy::Permissive, now()).unwrap();
        create_appointment(&f.conn, &request(&f, "2030-01-07", "10:30", 60), now()).unwrap();

        let result = update_status(
            &f.conn,
            &old.id,
            AppointmentStatus::Confirmed,
            TransitionPolicy::Permissive,
            now(),
        );
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_update_status_missing_appointment() {
        let f = fixture();
        let result = update_status(
            &f.conn,
            "missing",
            AppointmentStatus::Confirmed,
            TransitionPolicy::Permissive,
            now(),
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_status_keeps_cancellation_fields_consistent() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let cancelled_at = dt("2030-01-02 09:00:00");
        let cancelled = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Cancelled,
            TransitionPolicy::Permissive,
            cancelled_at,
        )
        .unwrap();
        assert_eq!(cancelled.cancelled_at, Some(cancelled_at));

        cancel_appointment(
            &f.conn,
            &created.id,
            Some("sick".to_string()),
            TransitionPolicy::Permissive,
            cancelled_at,
        )
        .unwrap();

        let reactivated = update_status(
            &f.conn,
            &created.id,
            AppointmentStatus::Confirmed,
            TransitionPolicy::Permissive,
            dt("2030-01-03 09:00:00"),
        )
        .unwrap();
        assert_eq!(reactivated.status, AppointmentStatus::Confirmed);
        assert_eq!(reactivated.cancelled_at, None);
        assert_eq!(reactivated.cancellation_reason, None);
        assert_eq!(get_appointment(&f.conn, &created.id).unwrap(), reactivated);
    }

    #[test]
    fn test_cancel_twice_overwrites_reason_and_timestamp() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let first_at = dt("2030-01-02 09:00:00");
        let first = cancel_appointment(
            &f.conn,
            &created.id,
            Some("sick".to_string()),
            TransitionPolicy::Strict,
            first_at,
        )
        .unwrap();
        assert_eq!(first.status, AppointmentStatus::Cancelled);
        assert_eq!(first.cancelled_at, Some(first_at));
        assert_eq!(first.cancellation_reason.as_deref(), Some("sick"));

        let second_at = dt("2030-01-03 09:00:00");
        let second = cancel_appointment(
            &f.conn,
            &created.id,
            Some("travelling".to_string()),
            TransitionPolicy::Strict,
            second_at,
        )
        .unwrap();
        assert_eq!(second.cancelled_at, Some(second_at));
        assert_eq!(second.cancellation_reason.as_deref(), Some("travelling"));

        let stored = get_appointment(&f.conn, &created.id).unwrap();
        assert_eq!(stored, second);
    }

    #[test]
    fn test_strict_policy_blocks_cancelling_completed() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        update_status(&f.conn, &created.id, AppointmentStatus::Completed, TransitionPolicy::Permissive, now())
            .unwrap();

        let result = cancel_appointment(&f.conn, &created.id, None, TransitionPolicy::Strict, now());
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_reschedule_keeps_duration_and_recomputes_end() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 90), now()).unwrap();

        let moved = reschedule_appointment(&f.conn, &created.id, date("2030-01-09"), "14:15", now()).unwrap();
        assert_eq!(moved.date, date("2030-01-09"));
        assert_eq!(moved.start_time, t("14:15"));
        assert_eq!(moved.end_time, t("15:45"));
        assert_eq!(moved.duration_minutes, 90);
        assert_eq!(moved.status, AppointmentStatus::Pending);
        assert_eq!(moved.updated_at, Some(now()));
    }

    #[test]
    fn test_reschedule_may_overlap_its_own_old_slot() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let moved = reschedule_appointment(&f.conn, &created.id, date("2030-01-07"), "10:30", now()).unwrap();
        assert_eq!(moved.end_time, t("11:30"));
    }

    #[test]
    fn test_reschedule_onto_other_booking_conflicts() {
        let f = fixture();
        let mover = create_appointment(&f.conn, &request(&f, "2030-01-07", "09:00", 60), now()).unwrap();
        create_appointment(&f.conn, &request(&f, "2030-01-08", "10:00", 60), now()).unwrap();

        let result = reschedule_appointment(&f.conn, &mover.id, date("2030-01-08"), "10:30", now());
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let unchanged = get_appointment(&f.conn, &mover.id).unwrap();
        assert_eq!(unchanged.date, date("2030-01-07"));
    }

    #[test]
    fn test_reschedule_validates_input() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        let bad_time = reschedule_appointment(&f.conn, &created.id, date("2030-01-08"), "25:99", now());
        assert!(matches!(bad_time, Err(AppError::Validation(_))));

        let past = reschedule_appointment(&f.conn, &created.id, date("2029-06-01"), "10:00", now());
        assert!(matches!(past, Err(AppError::Validation(_))));

        let missing = reschedule_appointment(&f.conn, "missing", date("2030-01-08"), "10:00", now());
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_delete_appointment() {
        let f = fixture();
        let created = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();

        delete_appointment(&f.conn, &created.id).unwrap();
        assert!(matches!(get_appointment(&f.conn, &created.id), Err(AppError::NotFound(_))));
        assert!(matches!(delete_appointment(&f.conn, &created.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_upcoming_and_past_split_on_today() {
        let f = fixture();
        let early = now() - Duration::days(30);
        let a = create_appointment(&f.conn, &request(&f, "2030-01-03", "10:00", 60), early).unwrap();
        let b = create_appointment(&f.conn, &request(&f, "2030-01-05", "10:00", 60), early).unwrap();
        let c = create_appointment(&f.conn, &request(&f, "2030-01-08", "10:00", 60), early).unwrap();
        let d = create_appointment(&f.conn, &request(&f, "2030-01-10", "09:00", 60), early).unwrap();

        let today = date("2030-01-05");
        let ids = |list: Vec<Appointment>| list.into_iter().map(|a| a.id).collect::<Vec<_>>();

        assert_eq!(
            ids(upcoming_for_customer(&f.conn, f.customer, today).unwrap()),
            vec![b.id.clone(), c.id.clone(), d.id.clone()]
        );
        assert_eq!(ids(past_for_customer(&f.conn, f.customer, today).unwrap()), vec![a.id.clone()]);
        assert_eq!(
            ids(upcoming_for_business(&f.conn, f.business, date("2030-01-09")).unwrap()),
            vec![d.id.clone()]
        );
        assert_eq!(
            ids(past_for_business(&f.conn, f.business, date("2030-01-09")).unwrap()),
            vec![c.id, b.id, a.id]
        );
    }

    #[test]
    fn test_queries_resolve_owner_first() {
        let f = fixture();
        let today = date("2030-01-01");

        assert!(matches!(appointments_for_customer(&f.conn, 999, None), Err(AppError::NotFound(_))));
        assert!(matches!(appointments_for_business(&f.conn, 999, None), Err(AppError::NotFound(_))));
        assert!(matches!(upcoming_for_customer(&f.conn, 999, today), Err(AppError::NotFound(_))));
        assert!(matches!(past_for_business(&f.conn, 999, today), Err(AppError::NotFound(_))));
        assert!(appointments_for_customer(&f.conn, f.customer, None).unwrap().is_empty());
    }

    #[test]
    fn test_status_and_date_queries() {
        let f = fixture();
        let a = create_appointment(&f.conn, &request(&f, "2030-01-07", "10:00", 60), now()).unwrap();
        let b = create_appointment(&f.conn, &request(&f, "2030-01-08", "10:00", 60), now()).unwrap();
        update_status(&f.conn, &b.id, AppointmentStatus::Confirmed, TransitionPolicy::Permissive, now())
            .unwrap();

        let confirmed = appointments_by_status(&f.conn, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, b.id);

        let pending =
            appointments_for_customer(&f.conn, f.customer, Some(AppointmentStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let on_day = appointments_on_date(&f.conn, date("2030-01-07")).unwrap();
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].id, a.id);

        let business_day = appointments_for_business_on(&f.conn, f.business, date("2030-01-08")).unwrap();
        assert_eq!(business_day.len(), 1);
        assert_eq!(business_day[0].id, b.id);
    }
}
