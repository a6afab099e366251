pub mod analytics;
pub mod appointments;
pub mod health;
pub mod hours;
pub mod listings;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use chrono::NaiveDateTime;

use crate::state::AppState;

/// Wall-clock "now", read once per request and handed to the core.
pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Appointments
        .route("/api/appointments", post(appointments::create_appointment))
        .route(
            "/api/appointments/available-slots",
            get(appointments::available_slots),
        )
        .route(
            "/api/appointments/:id",
            get(appointments::get_appointment).delete(appointments::delete_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            patch(appointments::update_status),
        )
        .route(
            "/api/appointments/:id/cancel",
            patch(appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/reschedule",
            patch(appointments::reschedule_appointment),
        )
        .route(
            "/api/appointments/customer/:id",
            get(appointments::customer_appointments),
        )
        .route(
            "/api/appointments/customer/:id/upcoming",
            get(appointments::customer_upcoming),
        )
        .route(
            "/api/appointments/customer/:id/past",
            get(appointments::customer_past),
        )
        .route(
            "/api/appointments/business/:id",
            get(appointments::business_appointments),
        )
        .route(
            "/api/appointments/business/:id/date/:date",
            get(appointments::business_appointments_on),
        )
        .route(
            "/api/appointments/business/:id/upcoming",
            get(appointments::business_upcoming),
        )
        .route(
            "/api/appointments/business/:id/past",
            get(appointments::business_past),
        )
        .route(
            "/api/appointments/status/:status",
            get(appointments::appointments_by_status),
        )
        .route(
            "/api/appointments/date/:date",
            get(appointments::appointments_on_date),
        )
        // Analytics
        .route(
            "/api/business-analytics/:id",
            get(analytics::default_analytics),
        )
        .route(
            "/api/business-analytics/:id/period",
            get(analytics::period_analytics),
        )
        .route(
            "/api/business-analytics/:id/daily",
            get(analytics::daily_analytics),
        )
        .route(
            "/api/business-analytics/:id/weekly",
            get(analytics::weekly_analytics),
        )
        .route(
            "/api/business-analytics/:id/monthly",
            get(analytics::monthly_analytics),
        )
        .route(
            "/api/business-analytics/:id/yearly",
            get(analytics::yearly_analytics),
        )
        // Business hours
        .route("/api/business-hours", post(hours::create_hours))
        .route(
            "/api/business-hours/:id",
            get(hours::get_hours)
                .put(hours::update_hours)
                .delete(hours::delete_hours),
        )
        .route("/api/business-hours/:id/open", patch(hours::set_open))
        .route(
            "/api/business-hours/business/:id",
            get(hours::business_hours),
        )
        .route(
            "/api/business-hours/business/:id/day/:day",
            get(hours::business_hours_for_day),
        )
        // Listings
        .route("/api/business-listings", get(listings::list_businesses))
        .with_state(state)
}
