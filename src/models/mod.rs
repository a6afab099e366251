pub mod analytics;
pub mod appointment;
pub mod business;
pub mod clock;
pub mod listing;

pub use analytics::{AnalyticsSummary, DateWindow, ServiceStats, WindowKind};
pub use appointment::{Appointment, AppointmentStatus, CreateAppointmentRequest, TransitionPolicy};
pub use business::{
    Business, BusinessHours, BusinessHoursId, BusinessHoursUpdate, BusinessId, Customer, CustomerId,
    NewBusinessHours, Service, ServiceId,
};
pub use listing::{BusinessListing, Category, ServiceListing};
