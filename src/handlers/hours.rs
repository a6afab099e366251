use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::business::parse_weekday;
use crate::models::clock::parse_time;
use crate::models::{BusinessHours, BusinessHoursId, BusinessHoursUpdate, BusinessId, NewBusinessHours};
use crate::services::hours;
use crate::state::AppState;

fn default_open() -> bool {
    true
}

#[derive(Deserialize)]
pub struct HoursBody {
    pub business_id: BusinessId,
    pub day_of_week: String,
    pub open_time: String,
    pub close_time: String,
    #[serde(default = "default_open")]
    pub is_open: bool,
}

// POST /api/business-hours
pub async fn create_hours(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HoursBody>,
) -> Result<(StatusCode, Json<BusinessHours>), AppError> {
    let new = NewBusinessHours {
        business_id: body.business_id,
        day_of_week: parse_weekday(&body.day_of_week)?,
        open_time: parse_time(&body.open_time)?,
        close_time: parse_time(&body.close_time)?,
        is_open: body.is_open,
    };

    let created = {
        let db = state.store()?;
        hours::create_business_hours(&*db, &new)?
    };

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/business-hours/:id
pub async fn get_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessHoursId>,
) -> Result<Json<BusinessHours>, AppError> {
    let db = state.store()?;
    Ok(Json(hours::get_business_hours(&*db, id)?))
}

// PUT /api/business-hours/:id
#[derive(Deserialize)]
pub struct UpdateHoursBody {
    pub day_of_week: String,
    pub open_time: String,
    pub close_time: String,
    #[serde(default = "default_open")]
    pub is_open: bool,
}

pub async fn update_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessHoursId>,
    Json(body): Json<UpdateHoursBody>,
) -> Result<Json<BusinessHours>, AppError> {
    let update = BusinessHoursUpdate {
        day_of_week: parse_weekday(&body.day_of_week)?,
        open_time: parse_time(&body.open_time)?,
        close_time: parse_time(&body.close_time)?,
        is_open: body.is_open,
    };

    let db = state.store()?;
    Ok(Json(hours::update_business_hours(&*db, id, &update)?))
}

// DELETE /api/business-hours/:id
pub async fn delete_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessHoursId>,
) -> Result<StatusCode, AppError> {
    let db = state.store()?;
    hours::delete_business_hours(&*db, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/business-hours/:id/open
#[derive(Deserialize)]
pub struct OpenBody {
    pub is_open: bool,
}

pub async fn set_open(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessHoursId>,
    Json(body): Json<OpenBody>,
) -> Result<Json<BusinessHours>, AppError> {
    let db = state.store()?;
    Ok(Json(hours::set_business_hours_open(&*db, id, body.is_open)?))
}

// GET /api/business-hours/business/:id
pub async fn business_hours(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<BusinessHours>>, AppError> {
    let db = state.store()?;
    Ok(Json(hours::business_hours_for(&*db, business_id)?))
}

// GET /api/business-hours/business/:id/day/:day
pub async fn business_hours_for_day(
    State(state): State<Arc<AppState>>,
    Path((business_id, day)): Path<(BusinessId, String)>,
) -> Result<Json<BusinessHours>, AppError> {
    let day = parse_weekday(&day)?;

    let db = state.store()?;
    Ok(Json(hours::business_hours_for_day(&*db, business_id, day)?))
}
