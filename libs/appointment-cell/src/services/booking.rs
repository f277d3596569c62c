// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{
    Appointment, AppointmentDraft, AppointmentError, BookAppointmentRequest, BookingCandidate,
    BookingDecision, BookingRejection, UpdateAppointmentRequest,
};
use crate::services::conflict;
use crate::services::lifecycle::AppointmentLifecycleService;

const APPOINTMENT_SELECT: &str = "select=*,meal_plan:meal_plans(*)";

/// Postgres function that re-checks and inserts under a per-doctor lock.
const BOOK_APPOINTMENT_RPC: &str = "book_appointment";

/// Postgres function that updates an appointment and upserts its meal plan together.
const REVIEW_APPOINTMENT_RPC: &str = "review_appointment";

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    availability_service: AvailabilityService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            availability_service: AvailabilityService::new(Arc::clone(&supabase)),
            lifecycle_service: AppointmentLifecycleService::new(),
            supabase,
        }
    }

    /// Decide a booking without writing anything.
    pub async fn check_booking(
        &self,
        request: &BookAppointmentRequest,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<BookingDecision, AppointmentError> {
        let candidate = match BookingCandidate::try_from(request) {
            Ok(candidate) => candidate,
            Err(rejection) => return Ok(BookingDecision::Rejected(rejection)),
        };

        match self.evaluate(&candidate, patient_id, auth_token).await? {
            Ok(draft) => Ok(BookingDecision::Accepted(draft)),
            Err(rejection) => Ok(BookingDecision::Rejected(rejection)),
        }
    }

    /// Decide a booking and, when accepted, store it as a pending appointment.
    pub async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking request from patient {} for doctor {}", patient_id, request.doctor_id);

        let draft = match self.check_booking(request, patient_id, auth_token).await? {
            BookingDecision::Accepted(draft) => draft,
            BookingDecision::Rejected(rejection) => {
                warn!("Booking rejected for patient {}: {}", patient_id, rejection.code());
                return Err(rejection.into());
            }
        };

        let appointment = self.persist_draft(&draft, auth_token).await?;

        info!(
            "Appointment {} booked: doctor {} on {} {}-{}",
            appointment.id,
            appointment.doctor_id,
            appointment.appointment_date,
            appointment.start(),
            appointment.end()
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}&{}", appointment_id, APPOINTMENT_SELECT);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(map_database_error)?;

        let row = result.into_iter().next().ok_or(AppointmentError::NotFound)?;
        parse_appointment(row)
    }

    /// A patient's appointments, newest first.
    pub async fn get_patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&{}&order=appointment_date.desc,start_time.desc",
            patient_id, APPOINTMENT_SELECT
        );
        self.fetch_appointments(&path, auth_token).await
    }

    /// A doctor's appointments in calendar order.
    pub async fn get_doctor_appointments(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&{}&order=appointment_date.asc,start_time.asc",
            doctor_id, APPOINTMENT_SELECT
        );
        self.fetch_appointments(&path, auth_token).await
    }

    /// Doctor's review of an appointment: status, notes and meal plan are
    /// written in one transaction by the `review_appointment` RPC.
    pub async fn update_appointment(
        &self,
        current: &Appointment,
        request: &UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        request.validate()?;
        self.lifecycle_service.validate_status_transition(&current.status, &request.status)?;

        let params = json!({
            "p_appointment_id": current.id,
            "p_status": request.status,
            "p_notes": request.notes.trim(),
            "p_meal_plan": request.meal_plan.trim(),
        });

        let _: Value = self.supabase
            .rpc(REVIEW_APPOINTMENT_RPC, Some(auth_token), params)
            .await
            .map_err(map_database_error)?;

        info!("Appointment {} updated to {}", current.id, request.status);

        self.get_appointment(current.id, auth_token).await
    }

    async fn evaluate(
        &self,
        candidate: &BookingCandidate,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Result<AppointmentDraft, BookingRejection>, AppointmentError> {
        let windows = self.availability_service
            .get_doctor_availability(candidate.doctor_id, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let window = match conflict::check_available_day(candidate, &windows) {
            Ok(window) => window,
            Err(rejection) => return Ok(Err(rejection)),
        };
        if let Err(rejection) = conflict::check_within_hours(candidate, window) {
            return Ok(Err(rejection));
        }

        let existing = self.get_booked_appointments(candidate, auth_token).await?;

        Ok(conflict::check_no_overlap(candidate, &existing)
            .map(|()| AppointmentDraft::pending(candidate, patient_id)))
    }

    /// Non-cancelled appointments of the candidate's doctor on the candidate's date.
    async fn get_booked_appointments(
        &self,
        candidate: &BookingCandidate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.CANCELLED&order=start_time.asc",
            candidate.doctor_id, candidate.date
        );
        self.fetch_appointments(&path, auth_token).await
    }

    /// The RPC repeats the overlap check inside a transaction holding a
    /// per-doctor advisory lock, so two racing bookings cannot both land.
    async fn persist_draft(
        &self,
        draft: &AppointmentDraft,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let params = json!({
            "p_doctor_id": draft.doctor_id,
            "p_patient_id": draft.patient_id,
            "p_appointment_date": draft.appointment_date,
            "p_start_time": draft.start_time,
            "p_end_time": draft.end_time,
        });

        let row: Value = self.supabase
            .rpc(BOOK_APPOINTMENT_RPC, Some(auth_token), params)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(message) => {
                    warn!("Slot taken while booking for doctor {}: {}", draft.doctor_id, message);
                    AppointmentError::Rejected(BookingRejection::SlotAlreadyBooked)
                }
                other => map_database_error(other),
            })?;

        parse_appointment(row)
    }

    async fn fetch_appointments(&self, path: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(map_database_error)?;

        result.into_iter().map(parse_appointment).collect()
    }
}

fn parse_appointment(row: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}

fn map_database_error(error: DatabaseError) -> AppointmentError {
    match error {
        DatabaseError::NotFound(_) => AppointmentError::NotFound,
        DatabaseError::Auth(_) => AppointmentError::Unauthorized,
        other => AppointmentError::DatabaseError(other.to_string()),
    }
}
