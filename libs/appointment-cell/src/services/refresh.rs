// libs/appointment-cell/src/services/refresh.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

pub const PATIENT_VIEWS: &[&str] = &["/dashboard", "/appointments"];
pub const PROVIDER_VIEWS: &[&str] = &["/provider/dashboard", "/provider/appointments"];

/// Tells the web front end which cached list views are stale after a mutation.
pub struct ViewRefreshNotifier {
    client: Client,
    url: Option<String>,
}

impl ViewRefreshNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.view_refresh_url.clone(),
        }
    }

    /// Best effort; a failed refresh only means a view shows stale data until reload.
    pub async fn refresh(&self, paths: &[&str]) {
        let Some(url) = &self.url else {
            debug!("View refresh disabled, skipping {:?}", paths);
            return;
        };

        let result = self.client
            .post(url)
            .json(&json!({ "paths": paths }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Refreshed views {:?}", paths);
            }
            Ok(response) => warn!("View refresh returned {}", response.status()),
            Err(e) => warn!("View refresh failed: {}", e),
        }
    }

    pub async fn refresh_appointment_views(&self) {
        let paths: Vec<&str> = PATIENT_VIEWS.iter().chain(PROVIDER_VIEWS).copied().collect();
        self.refresh(&paths).await;
    }
}
