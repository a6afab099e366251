use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::store::{AppointmentFilter, SortOrder};
use crate::models::business::{weekday_from_number, weekday_number};
use crate::models::clock::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use crate::models::{
    Appointment, AppointmentStatus, Business, BusinessHours, BusinessHoursId, BusinessId,
    Customer, CustomerId, NewBusinessHours, Service, ServiceId,
};

// ── Businesses ──

pub fn insert_business(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    active: bool,
) -> anyhow::Result<BusinessId> {
    conn.execute(
        "INSERT INTO businesses (name, description, active) VALUES (?1, ?2, ?3)",
        params![name, description, active],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_business(conn: &Connection, id: BusinessId) -> anyhow::Result<Option<Business>> {
    let business = conn
        .query_row(
            "SELECT id, name, description, active FROM businesses WHERE id = ?1",
            params![id],
            |row| {
                Ok(Business {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    active: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(business)
}

pub fn list_businesses(conn: &Connection) -> anyhow::Result<Vec<Business>> {
    let mut stmt = conn.prepare("SELECT id, name, description, active FROM businesses ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Business {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            active: row.get(3)?,
        })
    })?;

    let mut businesses = vec![];
    for row in rows {
        businesses.push(row?);
    }
    Ok(businesses)
}

// ── Customers ──

pub fn insert_customer(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> anyhow::Result<CustomerId> {
    conn.execute(
        "INSERT INTO customers (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![first_name, last_name, email],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_customer(conn: &Connection, id: CustomerId) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, first_name, last_name, email FROM customers WHERE id = ?1",
            params![id],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(customer)
}

// ── Services ──

pub fn insert_service(
    conn: &Connection,
    business_id: BusinessId,
    name: &str,
    duration_minutes: i32,
    price: Decimal,
    active: bool,
) -> anyhow::Result<ServiceId> {
    conn.execute(
        "INSERT INTO services (business_id, name, duration_minutes, price, active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![business_id, name, duration_minutes, price.to_string(), active],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE services SET name = ?1, duration_minutes = ?2, price = ?3, active = ?4 WHERE id = ?5",
        params![
            service.name,
            service.duration_minutes,
            service.price.to_string(),
            service.active,
            service.id,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: ServiceId) -> anyhow::Result<Option<Service>> {
    let result = conn
        .query_row(
            "SELECT id, business_id, name, duration_minutes, price, active FROM services WHERE id = ?1",
            params![id],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_services_for_business(
    conn: &Connection,
    business_id: BusinessId,
) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, name, duration_minutes, price, active
         FROM services WHERE business_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![business_id], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let price_str: String = row.get(4)?;

    Ok(Service {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: parse_decimal(&price_str)?,
        active: row.get(5)?,
    })
}

// ── Business Hours ──

const HOURS_COLUMNS: &str = "id, business_id, day_of_week, open_time, close_time, is_open";

pub fn insert_business_hours(
    conn: &Connection,
    hours: &NewBusinessHours,
) -> anyhow::Result<BusinessHours> {
    conn.execute(
        "INSERT INTO business_hours (business_id, day_of_week, open_time, close_time, is_open)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            hours.business_id,
            weekday_number(hours.day_of_week),
            hours.open_time.format(TIME_FORMAT).to_string(),
            hours.close_time.format(TIME_FORMAT).to_string(),
            hours.is_open,
        ],
    )?;

    Ok(BusinessHours {
        id: conn.last_insert_rowid(),
        business_id: hours.business_id,
        day_of_week: hours.day_of_week,
        open_time: hours.open_time,
        close_time: hours.close_time,
        is_open: hours.is_open,
    })
}

pub fn update_business_hours(conn: &Connection, hours: &BusinessHours) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE business_hours SET day_of_week = ?1, open_time = ?2, close_time = ?3, is_open = ?4
         WHERE id = ?5",
        params![
            weekday_number(hours.day_of_week),
            hours.open_time.format(TIME_FORMAT).to_string(),
            hours.close_time.format(TIME_FORMAT).to_string(),
            hours.is_open,
            hours.id,
        ],
    )?;
    Ok(())
}

pub fn get_business_hours(
    conn: &Connection,
    id: BusinessHoursId,
) -> anyhow::Result<Option<BusinessHours>> {
    let result = conn
        .query_row(
            &format!("SELECT {HOURS_COLUMNS} FROM business_hours WHERE id = ?1"),
            params![id],
            |row| Ok(parse_hours_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_business_hours_for_day(
    conn: &Connection,
    business_id: BusinessId,
    day: Weekday,
) -> anyhow::Result<Option<BusinessHours>> {
    let result = conn
        .query_row(
            &format!(
                "SELECT {HOURS_COLUMNS} FROM business_hours WHERE business_id = ?1 AND day_of_week = ?2"
            ),
            params![business_id, weekday_number(day)],
            |row| Ok(parse_hours_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_business_hours_for_business(
    conn: &Connection,
    business_id: BusinessId,
) -> anyhow::Result<Vec<BusinessHours>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOURS_COLUMNS} FROM business_hours WHERE business_id = ?1 ORDER BY day_of_week ASC"
    ))?;
    let rows = stmt.query_map(params![business_id], |row| Ok(parse_hours_row(row)))?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row??);
    }
    Ok(hours)
}

pub fn delete_business_hours(conn: &Connection, id: BusinessHoursId) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM business_hours WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_hours_row(row: &rusqlite::Row) -> anyhow::Result<BusinessHours> {
    let day_number: u32 = row.get(2)?;
    let open_str: String = row.get(3)?;
    let close_str: String = row.get(4)?;

    Ok(BusinessHours {
        id: row.get(0)?,
        business_id: row.get(1)?,
        day_of_week: weekday_from_number(day_number)
            .with_context(|| format!("invalid stored weekday: {day_number}"))?,
        open_time: parse_time(&open_str)?,
        close_time: parse_time(&close_str)?,
        is_open: row.get(5)?,
    })
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, customer_id, business_id, service_id, date, start_time, end_time, \
     duration_minutes, price, status, notes, cancellation_reason, created_at, updated_at, cancelled_at";

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            appointment.id,
            appointment.customer_id,
            appointment.business_id,
            appointment.service_id,
            appointment.date.format(DATE_FORMAT).to_string(),
            appointment.start_time.format(TIME_FORMAT).to_string(),
            appointment.end_time.format(TIME_FORMAT).to_string(),
            appointment.duration_minutes,
            appointment.price.to_string(),
            appointment.status.as_str(),
            appointment.notes,
            appointment.cancellation_reason,
            appointment.created_at.format(TIMESTAMP_FORMAT).to_string(),
            format_opt_timestamp(appointment.updated_at),
            format_opt_timestamp(appointment.cancelled_at),
        ],
    )
    .with_context(|| format!("failed to insert appointment {}", appointment.id))?;
    Ok(())
}

pub fn update_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE appointments SET
           date = ?1,
           start_time = ?2,
           end_time = ?3,
           status = ?4,
           notes = ?5,
           cancellation_reason = ?6,
           updated_at = ?7,
           cancelled_at = ?8
         WHERE id = ?9",
        params![
            appointment.date.format(DATE_FORMAT).to_string(),
            appointment.start_time.format(TIME_FORMAT).to_string(),
            appointment.end_time.format(TIME_FORMAT).to_string(),
            appointment.status.as_str(),
            appointment.notes,
            appointment.cancellation_reason,
            format_opt_timestamp(appointment.updated_at),
            format_opt_timestamp(appointment.cancelled_at),
            appointment.id,
        ],
    )
    .with_context(|| format!("failed to update appointment {}", appointment.id))?;
    Ok(())
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let result = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            |row| Ok(parse_appointment_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn find_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> anyhow::Result<Vec<Appointment>> {
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(business_id) = filter.business_id {
        params_vec.push(Box::new(business_id));
        clauses.push(format!("business_id = ?{}", params_vec.len()));
    }
    if let Some(customer_id) = filter.customer_id {
        params_vec.push(Box::new(customer_id));
        clauses.push(format!("customer_id = ?{}", params_vec.len()));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", params_vec.len()));
    }
    if let Some(date) = filter.date {
        params_vec.push(Box::new(date.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date = ?{}", params_vec.len()));
    }
    if let Some(from) = filter.from {
        params_vec.push(Box::new(from.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date >= ?{}", params_vec.len()));
    }
    if let Some(until) = filter.until {
        params_vec.push(Box::new(until.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date <= ?{}", params_vec.len()));
    }
    if let Some(before) = filter.before {
        params_vec.push(Box::new(before.format(DATE_FORMAT).to_string()));
        clauses.push(format!("date < ?{}", params_vec.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    // Zero-padded ISO text sorts chronologically.
    let order_clause = match filter.order {
        SortOrder::Ascending => "ORDER BY date ASC, start_time ASC, created_at ASC",
        SortOrder::Descending => "ORDER BY date DESC, start_time DESC, created_at DESC",
    };

    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments {where_clause} {order_clause}");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn delete_appointment(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let date_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let price_str: String = row.get(8)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: Option<String> = row.get(13)?;
    let cancelled_at_str: Option<String> = row.get(14)?;

    Ok(Appointment {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        business_id: row.get(2)?,
        service_id: row.get(3)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .with_context(|| format!("invalid stored date: {date_str}"))?,
        start_time: parse_time(&start_str)?,
        end_time: parse_time(&end_str)?,
        duration_minutes: row.get(7)?,
        price: parse_decimal(&price_str)?,
        status: AppointmentStatus::from_str(&status_str)?,
        notes: row.get(10)?,
        cancellation_reason: row.get(11)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: updated_at_str.as_deref().map(parse_timestamp).transpose()?,
        cancelled_at: cancelled_at_str.as_deref().map(parse_timestamp).transpose()?,
    })
}

// ── Column codecs ──

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).with_context(|| format!("invalid stored time: {s}"))
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("invalid stored amount: {s}"))
}

fn format_opt_timestamp(ts: Option<NaiveDateTime>) -> Option<String> {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use rust_decimal_macros::dec;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn appointment(
        id: &str,
        business_id: BusinessId,
        customer_id: CustomerId,
        service_id: ServiceId,
        day: &str,
        start: &str,
        status: AppointmentStatus,
    ) -> Appointment {
        let start_time = time(start);
        Appointment {
            id: id.to_string(),
            customer_id,
            business_id,
            service_id,
            date: date(day),
            start_time,
            end_time: start_time + chrono::Duration::minutes(60),
            duration_minutes: 60,
            price: dec!(45.50),
            status,
            notes: Some("first visit".to_string()),
            cancellation_reason: None,
            created_at: date("2025-01-02").and_hms_opt(8, 15, 0).unwrap(),
            updated_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_service_roundtrip_keeps_exact_price() {
        let conn = setup_db();
        let biz = insert_business(&conn, "Cuts", None, true).unwrap();
        let id = insert_service(&conn, biz, "Trim", 30, dec!(19.99), true).unwrap();

        let service = get_service(&conn, id).unwrap().unwrap();
        assert_eq!(service.price, dec!(19.99));
        assert_eq!(service.duration_minutes, 30);
        assert!(get_service(&conn, id + 100).unwrap().is_none());
    }

    #[test]
    fn test_appointment_roundtrip() {
        let conn = setup_db();
        let biz = insert_business(&conn, "Cuts", None, true).unwrap();
        let cust = insert_customer(&conn, "Ada", "Lovelace", "ada@example.com").unwrap();
        let svc = insert_service(&conn, biz, "Trim", 60, dec!(45.50), true).unwrap();

        let appt = appointment("a-1", biz, cust, svc, "2030-03-04", "10:00", AppointmentStatus::Pending);
        create_appointment(&conn, &appt).unwrap();

        let loaded = get_appointment_by_id(&conn, "a-1").unwrap().unwrap();
        assert_eq!(loaded, appt);
    }

    #[test]
    fn test_find_appointments_filters_and_orders() {
        let conn = setup_db();
        let biz = insert_business(&conn, "Cuts", None, true).unwrap();
        let other_biz = insert_business(&conn, "Nails", None, true).unwrap();
        let cust = insert_customer(&conn, "Ada", "Lovelace", "ada@example.com").unwrap();
        let svc = insert_service(&conn, biz, "Trim", 60, dec!(45.50), true).unwrap();

        for appt in [
            appointment("a-3", biz, cust, svc, "2030-03-05", "09:00", AppointmentStatus::Confirmed),
            appointment("a-1", biz, cust, svc, "2030-03-04", "14:00", AppointmentStatus::Pending),
            appointment("a-2", biz, cust, svc, "2030-03-04", "09:00", AppointmentStatus::Cancelled),
            appointment("b-1", other_biz, cust, svc, "2030-03-04", "11:00", AppointmentStatus::Pending),
        ] {
            create_appointment(&conn, &appt).unwrap();
        }

        let ids = |filter: AppointmentFilter| -> Vec<String> {
            find_appointments(&conn, &filter)
                .unwrap()
                .into_iter()
                .map(|a| a.id)
                .collect()
        };

        assert_eq!(ids(AppointmentFilter::for_business(biz)), vec!["a-2", "a-1", "a-3"]);
        assert_eq!(
            ids(AppointmentFilter::for_business(biz).descending()),
            vec!["a-3", "a-1", "a-2"]
        );
        assert_eq!(
            ids(AppointmentFilter::for_business(biz).on(date("2030-03-04"))),
            vec!["a-2", "a-1"]
        );
        assert_eq!(
            ids(AppointmentFilter::for_business(biz).with_status(AppointmentStatus::Confirmed)),
            vec!["a-3"]
        );
        assert_eq!(
            ids(AppointmentFilter::for_customer(cust).between(date("2030-03-04"), date("2030-03-04"))),
            vec!["a-2", "b-1", "a-1"]
        );
        assert_eq!(
            ids(AppointmentFilter::for_business(biz).before(date("2030-03-05"))),
            vec!["a-2", "a-1"]
        );
    }

    #[test]
    fn test_active_start_index_rejects_duplicate_but_ignores_cancelled() {
        let conn = setup_db();
        let biz = insert_business(&conn, "Cuts", None, true).unwrap();
        let cust = insert_customer(&conn, "Ada", "Lovelace", "ada@example.com").unwrap();
        let svc = insert_service(&conn, biz, "Trim", 60, dec!(45.50), true).unwrap();

        let cancelled = appointment("x-1", biz, cust, svc, "2030-03-04", "10:00", AppointmentStatus::Cancelled);
        let first = appointment("x-2", biz, cust, svc, "2030-03-04", "10:00", AppointmentStatus::Pending);
        let dup = appointment("x-3", biz, cust, svc, "2030-03-04", "10:00", AppointmentStatus::Confirmed);

        create_appointment(&conn, &cancelled).unwrap();
        create_appointment(&conn, &first).unwrap();
        assert!(create_appointment(&conn, &dup).is_err());
    }

    #[test]
    fn test_business_hours_unique_per_day() {
        let conn = setup_db();
        let biz = insert_business(&conn, "Cuts", None, true).unwrap();
        let hours = NewBusinessHours {
            business_id: biz,
            day_of_week: Weekday::Tue,
            open_time: time("09:00"),
            close_time: time("17:00"),
            is_open: true,
        };

        let saved = insert_business_hours(&conn, &hours).unwrap();
        assert!(insert_business_hours(&conn, &hours).is_err());

        let loaded = get_business_hours_for_day(&conn, biz, Weekday::Tue).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(get_business_hours_for_day(&conn, biz, Weekday::Wed).unwrap().is_none());

        assert!(delete_business_hours(&conn, saved.id).unwrap());
        assert!(!delete_business_hours(&conn, saved.id).unwrap());
    }
}
