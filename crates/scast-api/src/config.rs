//! API configuration.

use scast_models::{CreditTierSchedule, TierScheduleError};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Bearer token required on the payment confirmation endpoint
    pub payment_webhook_token: Option<String>,
    /// Purchase tier to credit grant mapping
    pub tier_schedule: CreditTierSchedule,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB of script text is plenty
            environment: "development".to_string(),
            database_url: None,
            payment_webhook_token: None,
            tier_schedule: CreditTierSchedule::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Fails when `CREDIT_TIERS` is set but does not parse into a valid
    /// schedule; a bad tier table should stop the server at startup, not
    /// surface per payment.
    pub fn from_env() -> Result<Self, TierScheduleError> {
        let tier_schedule = match std::env::var("CREDIT_TIERS") {
            Ok(s) => CreditTierSchedule::parse(&s)?,
            Err(_) => CreditTierSchedule::default(),
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            payment_webhook_token: std::env::var("PAYMENT_WEBHOOK_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            tier_schedule,
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
