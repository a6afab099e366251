pub mod analytics;
pub mod booking;
pub mod hours;
pub mod listing;
pub mod scheduling;
