//! The calendar store: the narrow read/write surface the scheduling core
//! needs from persistence.
//!
//! The core only ever talks to [`CalendarStore`]; [`rusqlite::Connection`]
//! is the production implementation and, opened on `:memory:`, the test one.

use chrono::{NaiveDate, Weekday};
use rusqlite::Connection;

use super::queries;
use crate::models::{
    Appointment, AppointmentStatus, Business, BusinessHours, BusinessHoursId, BusinessId,
    Customer, CustomerId, NewBusinessHours, Service, ServiceId,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Earliest date first, then earliest start time.
    #[default]
    Ascending,
    /// Latest date first, then latest start time.
    Descending,
}

/// Conjunction of optional appointment predicates.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub business_id: Option<BusinessId>,
    pub customer_id: Option<CustomerId>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on the appointment date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the appointment date.
    pub until: Option<NaiveDate>,
    /// Exclusive upper bound on the appointment date.
    pub before: Option<NaiveDate>,
    pub order: SortOrder,
}

impl AppointmentFilter {
    pub fn for_business(business_id: BusinessId) -> Self {
        Self {
            business_id: Some(business_id),
            ..Self::default()
        }
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn between(mut self, from: NaiveDate, until: NaiveDate) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn starting_from(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn before(mut self, date: NaiveDate) -> Self {
        self.before = Some(date);
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }
}

pub trait CalendarStore {
    fn find_business(&self, id: BusinessId) -> anyhow::Result<Option<Business>>;
    fn list_businesses(&self) -> anyhow::Result<Vec<Business>>;
    fn find_customer(&self, id: CustomerId) -> anyhow::Result<Option<Customer>>;
    fn find_service(&self, id: ServiceId) -> anyhow::Result<Option<Service>>;
    fn list_services_for_business(&self, business_id: BusinessId) -> anyhow::Result<Vec<Service>>;

    fn find_business_hours(
        &self,
        business_id: BusinessId,
        day: Weekday,
    ) -> anyhow::Result<Option<BusinessHours>>;
    fn find_business_hours_by_id(&self, id: BusinessHoursId) -> anyhow::Result<Option<BusinessHours>>;
    fn list_business_hours(&self, business_id: BusinessId) -> anyhow::Result<Vec<BusinessHours>>;
    fn insert_business_hours(&self, hours: &NewBusinessHours) -> anyhow::Result<BusinessHours>;
    fn update_business_hours(&self, hours: &BusinessHours) -> anyhow::Result<()>;
    /// Returns `false` when no such record existed.
    fn delete_business_hours(&self, id: BusinessHoursId) -> anyhow::Result<bool>;

    fn find_appointment(&self, id: &str) -> anyhow::Result<Option<Appointment>>;
    fn find_appointments(&self, filter: &AppointmentFilter) -> anyhow::Result<Vec<Appointment>>;
    fn insert_appointment(&self, appointment: &Appointment) -> anyhow::Result<()>;
    fn update_appointment(&self, appointment: &Appointment) -> anyhow::Result<()>;
    /// Returns `false` when no such appointment existed.
    fn delete_appointment(&self, id: &str) -> anyhow::Result<bool>;
}

impl CalendarStore for Connection {
    fn find_business(&self, id: BusinessId) -> anyhow::Result<Option<Business>> {
        queries::get_business(self, id)
    }

    fn list_businesses(&self) -> anyhow::Result<Vec<Business>> {
        queries::list_businesses(self)
    }

    fn find_customer(&self, id: CustomerId) -> anyhow::Result<Option<Customer>> {
        queries::get_customer(self, id)
    }

    fn find_service(&self, id: ServiceId) -> anyhow::Result<Option<Service>> {
        queries::get_service(self, id)
    }

    fn list_services_for_business(&self, business_id: BusinessId) -> anyhow::Result<Vec<Service>> {
        queries::get_services_for_business(self, business_id)
    }

    fn find_business_hours(
        &self,
        business_id: BusinessId,
        day: Weekday,
    ) -> anyhow::Result<Option<BusinessHours>> {
        queries::get_business_hours_for_day(self, business_id, day)
    }

    fn find_business_hours_by_id(&self, id: BusinessHoursId) -> anyhow::Result<Option<BusinessHours>> {
        queries::get_business_hours(self, id)
    }

    fn list_business_hours(&self, business_id: BusinessId) -> anyhow::Result<Vec<BusinessHours>> {
        queries::get_business_hours_for_business(self, business_id)
    }

    fn insert_business_hours(&self, hours: &NewBusinessHours) -> anyhow::Result<BusinessHours> {
        queries::insert_business_hours(self, hours)
    }

    fn update_business_hours(&self, hours: &BusinessHours) -> anyhow::Result<()> {
        queries::update_business_hours(self, hours)
    }

    fn delete_business_hours(&self, id: BusinessHoursId) -> anyhow::Result<bool> {
        queries::delete_business_hours(self, id)
    }

    fn find_appointment(&self, id: &str) -> anyhow::Result<Option<Appointment>> {
        queries::get_appointment_by_id(self, id)
    }

    fn find_appointments(&self, filter: &AppointmentFilter) -> anyhow::Result<Vec<Appointment>> {
        queries::find_appointments(self, filter)
    }

    fn insert_appointment(&self, appointment: &Appointment) -> anyhow::Result<()> {
        queries::create_appointment(self, appointment)
    }

    fn update_appointment(&self, appointment: &Appointment) -> anyhow::Result<()> {
        queries::update_appointment(self, appointment)
    }

    fn delete_appointment(&self, id: &str) -> anyhow::Result<bool> {
        queries::delete_appointment(self, id)
    }
}
