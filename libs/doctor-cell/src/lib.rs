pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    AvailabilityWindow, DayAvailability, DayAvailabilityInput, Doctor, DoctorError,
    DoctorWithAvailability, WeeklyAvailabilityRequest,
};
pub use services::{AvailabilityService, DoctorService};
