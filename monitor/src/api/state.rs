use chrono::{DateTime, Utc};

use crate::service::AnomalyService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: AnomalyService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: AnomalyService) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
