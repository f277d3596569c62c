pub mod state;
pub mod supabase;

pub use state::AppState;
pub use supabase::{DatabaseError, SupabaseClient};
