use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::{AppointmentFilter, CalendarStore};
use crate::errors::AppError;
use crate::models::{
    AnalyticsSummary, Appointment, AppointmentStatus, Business, BusinessId, DateWindow, Service,
    ServiceId, ServiceStats, WindowKind,
};

pub const TOP_SERVICES: usize = 5;

/// Folds a business's appointments for `window` into summary figures.
///
/// `appointments` is expected to be scoped to the business and window
/// already. `today` only feeds `appointments_today`, which is not bounded
/// by the window.
pub fn aggregate(
    business: &Business,
    appointments: &[Appointment],
    services: &[Service],
    window: DateWindow,
    today: NaiveDate,
) -> AnalyticsSummary {
    let created_in_window = |a: &Appointment| window.contains(a.created_at.date());

    let appointments_today = appointments.iter().filter(|a| a.date == today).count();
    let new_bookings = appointments.iter().filter(|a| created_in_window(a)).count();

    let mut daily_revenue: BTreeMap<NaiveDate, Decimal> =
        window.days().map(|d| (d, Decimal::ZERO)).collect();
    let mut by_status: BTreeMap<AppointmentStatus, usize> =
        AppointmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut revenue = Decimal::ZERO;

    // Service tallies in first-seen order so the stable sort keeps ties in that order.
    let mut service_order: Vec<ServiceId> = vec![];
    let mut service_tally: HashMap<ServiceId, (usize, Decimal)> = HashMap::new();

    let mut customers = HashSet::new();
    let mut new_customers = HashSet::new();

    for appointment in appointments {
        *by_status.entry(appointment.status).or_insert(0) += 1;

        let tally = service_tally.entry(appointment.service_id).or_insert_with(|| {
            service_order.push(appointment.service_id);
            (0, Decimal::ZERO)
        });
        tally.0 += 1;

        if appointment.status.is_revenue() {
            revenue += appointment.price;
            tally.1 += appointment.price;
            if let Some(day) = daily_revenue.get_mut(&appointment.date) {
                *day += appointment.price;
            }
        }

        customers.insert(appointment.customer_id);
        if created_in_window(appointment) {
            new_customers.insert(appointment.customer_id);
        }
    }

    let mut top_services: Vec<ServiceStats> = service_order
        .iter()
        .map(|id| {
            let (booking_count, revenue) = service_tally.get(id).copied().unwrap_or_default();
            let service_name = services
                .iter()
                .find(|s| s.id == *id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("service {id}"));
            ServiceStats {
                service_id: *id,
                service_name,
                booking_count,
                revenue,
            }
        })
        .collect();
    top_services.sort_by(|a, b| b.booking_count.cmp(&a.booking_count));
    top_services.truncate(TOP_SERVICES);

    let total_customers = customers.len();
    let new_customers = new_customers.len();

    AnalyticsSummary {
        business_id: business.id,
        business_name: business.name.clone(),
        window_start: window.start,
        window_end: window.end,
        appointments_today,
        total_in_period: appointments.len(),
        new_bookings,
        cancelled: by_status
            .get(&AppointmentStatus::Cancelled)
            .copied()
            .unwrap_or_default(),
        revenue,
        daily_revenue,
        by_status,
        top_services,
        total_customers,
        new_customers,
        returning_customers: total_customers - new_customers,
    }
}

/// Loads the business's appointments dated inside `window` and aggregates them.
pub fn business_analytics<S>(
    store: &S,
    business_id: BusinessId,
    window: DateWindow,
    today: NaiveDate,
) -> Result<AnalyticsSummary, AppError>
where
    S: CalendarStore + ?Sized,
{
    let business = store
        .find_business(business_id)?
        .ok_or_else(|| AppError::not_found("business", business_id))?;

    let appointments = store.find_appointments(
        &AppointmentFilter::for_business(business.id).between(window.start, window.end),
    )?;
    let services = store.list_services_for_business(business.id)?;

    tracing::debug!(
        business_id = business.id,
        start = %window.start,
        end = %window.end,
        appointments = appointments.len(),
        "aggregating analytics"
    );

    Ok(aggregate(&business, &appointments, &services, window, today))
}

/// Analytics for the daily, weekly, monthly or yearly window around `today`.
pub fn canned_analytics<S>(
    store: &S,
    business_id: BusinessId,
    kind: WindowKind,
    today: NaiveDate,
) -> Result<AnalyticsSummary, AppError>
where
    S: CalendarStore + ?Sized,
{
    business_analytics(store, business_id, DateWindow::containing(kind, today), today)
}
