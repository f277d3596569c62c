pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    Appointment, AppointmentDraft, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    BookingCandidate, BookingDecision, BookingOutcome, BookingRejection, MealPlan,
    UpdateAppointmentRequest,
};
pub use router::appointment_routes;
pub use services::{AppointmentBookingService, AppointmentLifecycleService};
