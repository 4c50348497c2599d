use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub cron_secret: String,
    pub notification_sms_url: String,
    pub notification_email_url: String,
    pub notification_api_token: String,
    pub view_refresh_url: Option<String>,
    pub clinic_utc_offset_minutes: i32,
    pub reminder_sweep_budget_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            cron_secret: env::var("CRON_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CRON_SECRET not set, reminder trigger will reject every call");
                    String::new()
                }),
            notification_sms_url: env::var("NOTIFICATION_SMS_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_SMS_URL not set, using empty value");
                    String::new()
                }),
            notification_email_url: env::var("NOTIFICATION_EMAIL_URL")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_EMAIL_URL not set, using empty value");
                    String::new()
                }),
            notification_api_token: env::var("NOTIFICATION_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("NOTIFICATION_API_TOKEN not set, using empty value");
                    String::new()
                }),
            view_refresh_url: env::var("VIEW_REFRESH_URL").ok().filter(|url| !url.is_empty()),
            clinic_utc_offset_minutes: parse_or("CLINIC_UTC_OFFSET_MINUTES", 0),
            reminder_sweep_budget_secs: parse_or("REMINDER_SWEEP_BUDGET_SECS", 50),
            port: parse_or("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Cron sweeps and admin onboarding bypass row level security.
    pub fn is_service_role_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_role_key.is_empty()
    }

    pub fn is_notification_configured(&self) -> bool {
        !self.notification_sms_url.is_empty()
            && !self.notification_email_url.is_empty()
            && !self.notification_api_token.is_empty()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
