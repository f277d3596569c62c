use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DoctorError, WeeklyAvailabilityRequest};
use crate::services::{AvailabilityService, DoctorService};

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::Unauthorized => AppError::Forbidden(err.to_string()),
            DoctorError::Database(msg) => AppError::Database(msg),
            DoctorError::InvalidDayOfWeek(_)
            | DoctorError::DuplicateDay(_)
            | DoctorError::InvalidTime(_)
            | DoctorError::InvalidTimeRange(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(state.supabase.clone())
        .list_doctors(None)
        .await?;

    Ok(Json(json!({ "doctors": doctors })))
}

pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(state.supabase.clone())
        .get_doctor(doctor_id, None)
        .await?;

    Ok(Json(json!(doctor)))
}

pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let availability = AvailabilityService::new(state.supabase.clone())
        .get_doctor_availability(doctor_id, None)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn update_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<WeeklyAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the doctor themself or an admin may change a schedule
    if !user.is(&doctor_id) && !user.is_admin() {
        return Err(DoctorError::Unauthorized.into());
    }

    let availability = AvailabilityService::new(state.supabase.clone())
        .set_weekly_availability(doctor_id, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": availability,
        "message": "Availability schedule updated successfully"
    })))
}
