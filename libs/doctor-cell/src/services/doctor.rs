use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{DoctorError, DoctorWithAvailability};

const DOCTOR_SELECT: &str = "select=*,availability:doctor_availability(*)";

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All doctors with their weekly windows embedded.
    pub async fn list_doctors(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorWithAvailability>, DoctorError> {
        debug!("Listing doctors with availability");

        let path = format!("/rest/v1/doctors?{}&order=last_name.asc", DOCTOR_SELECT);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DoctorWithAvailability>, _>>()
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctors: {}", e)))
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorWithAvailability, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}&{}", doctor_id, DOCTOR_SELECT);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
    }
}
