// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentDraft, AppointmentError, BookAppointmentRequest, BookingOutcome,
    BookingRejection, UpdateAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::Rejected(BookingRejection::SlotAlreadyBooked) => AppError::Conflict(err.to_string()),
            AppointmentError::Rejected(_)
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    user.uuid()
        .ok_or_else(|| AppError::Auth("Token subject is not a valid user id".to_string()))
}

/// Book an appointment for the calling patient. Rejections are answered with
/// the booking outcome body rather than a plain error.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<BookingOutcome<Appointment>>), AppError> {
    if user.is_doctor() {
        return Err(AppError::Forbidden("Only patients can book appointments".to_string()));
    }
    let patient_id = caller_id(&user)?;

    let booking_service = AppointmentBookingService::new(state.supabase.clone());

    match booking_service.book_appointment(&request, patient_id, auth.token()).await {
        Ok(appointment) => Ok((StatusCode::CREATED, Json(BookingOutcome::accepted(appointment)))),
        Err(AppointmentError::Rejected(rejection)) => {
            let outcome = BookingOutcome::rejected(&rejection);
            let status = AppError::from(AppointmentError::Rejected(rejection)).status_code();
            Ok((status, Json(outcome)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Same evaluation as booking, nothing is written.
pub async fn check_appointment_conflicts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BookAppointmentRequest>, QueryRejection>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<BookingOutcome<AppointmentDraft>>, AppError> {
    let Query(request) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let patient_id = caller_id(&user)?;

    let decision = AppointmentBookingService::new(state.supabase.clone())
        .check_booking(&request, patient_id, auth.token())
        .await?;

    Ok(Json(decision.into()))
}

pub async fn get_my_appointments(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = caller_id(&user)?;

    let appointments = AppointmentBookingService::new(state.supabase.clone())
        .get_patient_appointments(patient_id, auth.token())
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is(&doctor_id) && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized to view this doctor's appointments".to_string()));
    }

    let appointments = AppointmentBookingService::new(state.supabase.clone())
        .get_doctor_appointments(doctor_id, auth.token())
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = AppointmentBookingService::new(state.supabase.clone())
        .get_appointment(appointment_id, auth.token())
        .await?;

    if !appointment.involves(&user.id) && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = AppointmentBookingService::new(state.supabase.clone());

    let appointment = booking_service.get_appointment(appointment_id, token).await?;

    // Only the assigned doctor reviews an appointment
    if !user.is(&appointment.doctor_id) && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized to update this appointment".to_string()));
    }

    let updated = booking_service.update_appointment(&appointment, &request, token).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
        "message": "Appointment updated successfully"
    })))
}
