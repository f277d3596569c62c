use std::sync::Arc;

use shared_config::AppConfig;

use crate::supabase::SupabaseClient;

/// Process-wide dependencies, built once at start-up and shared by every handler.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub supabase: Arc<SupabaseClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(&config));
        Self {
            config: Arc::new(config),
            supabase,
        }
    }
}
