use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{AvailabilityWindow, DoctorError, WeeklyAvailabilityRequest};

/// Day-of-week index used by availability rows: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

/// First window covering the weekday of `date` that is flagged available.
pub fn window_for_date(windows: &[AvailabilityWindow], date: NaiveDate) -> Option<&AvailabilityWindow> {
    let day = day_of_week(date);
    windows
        .iter()
        .find(|window| window.day_of_week == day && window.is_available)
}

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Get a doctor's weekly windows ordered by weekday
    pub async fn get_doctor_availability(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability for doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilityWindow>, _>>()
            .map_err(|e| DoctorError::Database(format!("Failed to parse availability: {}", e)))
    }

    /// Replace the submitted weekdays of a doctor's schedule, one row per weekday.
    pub async fn set_weekly_availability(
        &self,
        doctor_id: Uuid,
        request: &WeeklyAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let days = request.validate()?;

        if !days.is_empty() {
            let rows: Vec<Value> = days.iter()
                .map(|day| json!({
                    "doctor_id": doctor_id,
                    "day_of_week": day.day_of_week,
                    "start_time": day.start.to_naive_time().format("%H:%M:%S").to_string(),
                    "end_time": day.end.to_naive_time().format("%H:%M:%S").to_string(),
                    "is_available": day.is_available,
                }))
                .collect();

            let _: Vec<Value> = self.supabase.request_with_headers(
                Method::POST,
                "/rest/v1/doctor_availability?on_conflict=doctor_id,day_of_week",
                Some(auth_token),
                Some(Value::Array(rows)),
                Some(SupabaseClient::upsert_representation()),
            ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

            info!("Updated {} availability day(s) for doctor {}", days.len(), doctor_id);
        } else {
            debug!("No complete availability days submitted for doctor {}", doctor_id);
        }

        self.get_doctor_availability(doctor_id, Some(auth_token)).await
    }
}
