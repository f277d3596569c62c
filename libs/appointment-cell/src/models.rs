// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::time::TimeOfDay;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_plan: Option<MealPlan>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn start(&self) -> TimeOfDay {
        TimeOfDay::from(self.start_time.time())
    }

    pub fn end(&self) -> TimeOfDay {
        TimeOfDay::from(self.end_time.time())
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.patient_id.to_string() == user_id || self.doctor_id.to_string() == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Cancelled appointments never hold a slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub plan: String,
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Booking input exactly as submitted; nothing has been checked yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// A parsed booking request: valid ids, a real date and a non-empty time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingCandidate {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TryFrom<&BookAppointmentRequest> for BookingCandidate {
    type Error = BookingRejection;

    fn try_from(request: &BookAppointmentRequest) -> Result<Self, Self::Error> {
        let doctor_id = Uuid::parse_str(request.doctor_id.trim())
            .map_err(|_| BookingRejection::InvalidDoctorId(request.doctor_id.clone()))?;

        let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
            .map_err(|_| BookingRejection::InvalidDate(request.date.clone()))?;

        let start = TimeOfDay::parse(&request.start_time).map_err(|_| BookingRejection::InvalidTimeFormat {
            field: "start_time",
            value: request.start_time.clone(),
        })?;
        let end = TimeOfDay::parse(&request.end_time).map_err(|_| BookingRejection::InvalidTimeFormat {
            field: "end_time",
            value: request.end_time.clone(),
        })?;

        if end <= start {
            return Err(BookingRejection::InvalidTimeRange);
        }

        Ok(Self { doctor_id, date, start, end })
    }
}

impl BookingCandidate {
    pub fn start_timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.start.to_naive_time())
    }

    pub fn end_timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.end.to_naive_time())
    }
}

/// An accepted booking, ready to be written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDraft {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: String,
}

impl AppointmentDraft {
    pub fn pending(candidate: &BookingCandidate, patient_id: Uuid) -> Self {
        Self {
            doctor_id: candidate.doctor_id,
            patient_id,
            appointment_date: candidate.date,
            start_time: candidate.start_timestamp(),
            end_time: candidate.end_timestamp(),
            status: AppointmentStatus::Pending,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingDecision {
    Accepted(AppointmentDraft),
    Rejected(BookingRejection),
}

impl BookingDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BookingDecision::Accepted(_))
    }
}

/// Wire shape of a booking verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome<T> {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl<T> BookingOutcome<T> {
    pub fn accepted(appointment: T) -> Self {
        Self {
            accepted: true,
            appointment: Some(appointment),
            reason: None,
            code: None,
            field: None,
        }
    }

    pub fn rejected(rejection: &BookingRejection) -> Self {
        Self {
            accepted: false,
            appointment: None,
            reason: Some(rejection.to_string()),
            code: Some(rejection.code().to_string()),
            field: Some(rejection.field().to_string()),
        }
    }
}

impl From<BookingDecision> for BookingOutcome<AppointmentDraft> {
    fn from(decision: BookingDecision) -> Self {
        match decision {
            BookingDecision::Accepted(draft) => Self::accepted(draft),
            BookingDecision::Rejected(rejection) => Self::rejected(&rejection),
        }
    }
}

// ==============================================================================
// UPDATE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: AppointmentStatus,
    pub notes: String,
    pub meal_plan: String,
}

impl UpdateAppointmentRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.notes.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Notes are required".to_string()));
        }
        if self.meal_plan.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Meal plan is required".to_string()));
        }
        Ok(())
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Reasons a booking is refused. All of them are shown to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingRejection {
    #[error("Doctor is not available on this day")]
    NotAvailableOnDay,

    #[error("Selected time must be between {} and {}", .window_start.to_12h_string(), .window_end.to_12h_string())]
    OutsideAvailableHours {
        window_start: TimeOfDay,
        window_end: TimeOfDay,
    },

    #[error("This time slot is already booked with another patient")]
    SlotAlreadyBooked,

    #[error("Invalid time '{value}', expected HH:MM")]
    InvalidTimeFormat { field: &'static str, value: String },

    #[error("End time must be after start time")]
    InvalidTimeRange,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid doctor id '{0}'")]
    InvalidDoctorId(String),
}

impl BookingRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BookingRejection::NotAvailableOnDay => "NOT_AVAILABLE_ON_DAY",
            BookingRejection::OutsideAvailableHours { .. } => "OUTSIDE_AVAILABLE_HOURS",
            BookingRejection::SlotAlreadyBooked => "SLOT_ALREADY_BOOKED",
            BookingRejection::InvalidTimeFormat { .. } => "INVALID_TIME_FORMAT",
            BookingRejection::InvalidTimeRange => "INVALID_TIME_RANGE",
            BookingRejection::InvalidDate(_) => "INVALID_DATE",
            BookingRejection::InvalidDoctorId(_) => "INVALID_DOCTOR_ID",
        }
    }

    /// Form field the message belongs next to.
    pub fn field(&self) -> &'static str {
        match self {
            BookingRejection::NotAvailableOnDay | BookingRejection::InvalidDate(_) => "date",
            BookingRejection::OutsideAvailableHours { .. }
            | BookingRejection::SlotAlreadyBooked => "start_time",
            BookingRejection::InvalidTimeFormat { field, .. } => *field,
            BookingRejection::InvalidTimeRange => "end_time",
            BookingRejection::InvalidDoctorId(_) => "doctor_id",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error(transparent)]
    Rejected(#[from] BookingRejection),

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
