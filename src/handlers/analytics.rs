use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::now;
use crate::models::clock::parse_date;
use crate::models::{AnalyticsSummary, BusinessId, DateWindow, WindowKind};
use crate::services::analytics;
use crate::state::AppState;

fn canned(state: &AppState, business_id: BusinessId, kind: WindowKind) -> Result<AnalyticsSummary, AppError> {
    let db = state.store()?;
    analytics::canned_analytics(&*db, business_id, kind, now().date())
}

// GET /api/business-analytics/:id
pub async fn default_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(canned(&state, business_id, WindowKind::Weekly)?))
}

// GET /api/business-analytics/:id/period
#[derive(Deserialize)]
pub struct PeriodQuery {
    pub start_date: String,
    pub end_date: String,
}

pub async fn period_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let window = DateWindow::new(parse_date(&query.start_date)?, parse_date(&query.end_date)?)?;

    let db = state.store()?;
    Ok(Json(analytics::business_analytics(&*db, business_id, window, now().date())?))
}

// GET /api/business-analytics/:id/daily
#[derive(Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

pub async fn daily_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let today = now().date();
    let day = match query.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => today,
    };

    let db = state.store()?;
    Ok(Json(analytics::business_analytics(&*db, business_id, DateWindow::day(day), today)?))
}

// GET /api/business-analytics/:id/weekly
pub async fn weekly_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(canned(&state, business_id, WindowKind::Weekly)?))
}

// GET /api/business-analytics/:id/monthly
pub async fn monthly_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(canned(&state, business_id, WindowKind::Monthly)?))
}

// GET /api/business-analytics/:id/yearly
pub async fn yearly_analytics(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(canned(&state, business_id, WindowKind::Yearly)?))
}
