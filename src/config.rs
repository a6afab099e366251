use std::env;

use crate::models::TransitionPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub transition_policy: TransitionPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbook.db".to_string()),
            transition_policy: env::var("STATUS_TRANSITIONS")
                .ok()
                .map(|v| {
                    v.parse().unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "falling back to permissive status transitions");
                        TransitionPolicy::Permissive
                    })
                })
                .unwrap_or_default(),
        }
    }
}
