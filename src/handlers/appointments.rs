use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::now;
use crate::models::clock::{parse_date, parse_time};
use crate::models::appointment::UnknownStatus;
use crate::models::{
    Appointment, AppointmentStatus, BusinessId, CreateAppointmentRequest, CustomerId, ServiceId,
};
use crate::services::{booking, scheduling};
use crate::state::AppState;

fn parse_status(s: &str) -> Result<AppointmentStatus, AppError> {
    s.parse()
        .map_err(|e: UnknownStatus| AppError::Validation(e.to_string()))
}

fn parse_status_opt(s: Option<&str>) -> Result<Option<AppointmentStatus>, AppError> {
    s.map(parse_status).transpose()
}

// POST /api/appointments
#[derive(Deserialize)]
pub struct CreateAppointmentBody {
    pub customer_id: CustomerId,
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAppointmentBody>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let req = CreateAppointmentRequest {
        customer_id: body.customer_id,
        business_id: body.business_id,
        service_id: body.service_id,
        date: parse_date(&body.date)?,
        start_time: parse_time(&body.start_time)?,
        duration_minutes: body.duration_minutes,
        notes: body.notes,
    };

    let appointment = {
        let db = state.store()?;
        booking::create_appointment(&*db, &req, now())?
    };

    Ok((StatusCode::CREATED, Json(appointment)))
}

// GET /api/appointments/available-slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub business_id: BusinessId,
    pub service_id: ServiceId,
    pub date: String,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let date = parse_date(&query.date)?;

    let slots = {
        let db = state.store()?;
        scheduling::available_time_slots(&*db, query.business_id, query.service_id, date)?
    };

    Ok(Json(slots))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let db = state.store()?;
    Ok(Json(booking::get_appointment(&*db, &id)?))
}

// DELETE /api/appointments/:id
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let db = state.store()?;
    booking::delete_appointment(&*db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/appointments/:id/status
#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Appointment>, AppError> {
    let target = parse_status(&body.status)?;

    let db = state.store()?;
    let appointment =
        booking::update_status(&*db, &id, target, state.config.transition_policy, now())?;
    Ok(Json(appointment))
}

// PATCH /api/appointments/:id/cancel
#[derive(Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

/// An empty body means "no reason"; anything else must be a JSON `CancelBody`.
fn cancel_reason(headers: &HeaderMap, body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return Err(AppError::Validation(
            "cancel body must be sent as application/json".to_string(),
        ));
    }

    let Json(body) = Json::<CancelBody>::from_bytes(body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    Ok(body.reason)
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Appointment>, AppError> {
    let reason = cancel_reason(&headers, &body)?;

    let db = state.store()?;
    let appointment =
        booking::cancel_appointment(&*db, &id, reason, state.config.transition_policy, now())?;
    Ok(Json(appointment))
}

// PATCH /api/appointments/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleBody {
    pub date: String,
    pub start_time: String,
}

pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<Appointment>, AppError> {
    let date = parse_date(&body.date)?;

    let db = state.store()?;
    let appointment = booking::reschedule_appointment(&*db, &id, date, &body.start_time, now())?;
    Ok(Json(appointment))
}

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

// GET /api/appointments/customer/:id
pub async fn customer_appointments(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<CustomerId>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let status = parse_status_opt(filter.status.as_deref())?;

    let db = state.store()?;
    Ok(Json(booking::appointments_for_customer(&*db, customer_id, status)?))
}

// GET /api/appointments/customer/:id/upcoming
pub async fn customer_upcoming(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let db = state.store()?;
    Ok(Json(booking::upcoming_for_customer(&*db, customer_id, now().date())?))
}

// GET /api/appointments/customer/:id/past
pub async fn customer_past(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let db = state.store()?;
    Ok(Json(booking::past_for_customer(&*db, customer_id, now().date())?))
}

// GET /api/appointments/business/:id
pub async fn business_appointments(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let status = parse_status_opt(filter.status.as_deref())?;

    let db = state.store()?;
    Ok(Json(booking::appointments_for_business(&*db, business_id, status)?))
}

// GET /api/appointments/business/:id/date/:date
pub async fn business_appointments_on(
    State(state): State<Arc<AppState>>,
    Path((business_id, date)): Path<(BusinessId, String)>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let date = parse_date(&date)?;

    let db = state.store()?;
    Ok(Json(booking::appointments_for_business_on(&*db, business_id, date)?))
}

// GET /api/appointments/business/:id/upcoming
pub async fn business_upcoming(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let db = state.store()?;
    Ok(Json(booking::upcoming_for_business(&*db, business_id, now().date())?))
}

// GET /api/appointments/business/:id/past
pub async fn business_past(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let db = state.store()?;
    Ok(Json(booking::past_for_business(&*db, business_id, now().date())?))
}

// GET /api/appointments/status/:status
pub async fn appointments_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let status = parse_status(&status)?;

    let db = state.store()?;
    Ok(Json(booking::appointments_by_status(&*db, status)?))
}

// GET /api/appointments/date/:date
pub async fn appointments_on_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let date = parse_date(&date)?;

    let db = state.store()?;
    Ok(Json(booking::appointments_on_date(&*db, date)?))
}
