use config::{Config, Environment};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub upstream: UpstreamSettings,
    pub monitoring: MonitoringSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the remote price-data API.
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Cache freshness window for price data.
    pub cache_ttl_seconds: u64,
    /// Fixed delay before the single retry of a rate-limited request.
    pub rate_limit_retry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringSettings {
    /// How often the metrics snapshot is recomputed.
    pub aggregation_interval_seconds: u64,
    /// How often the background task refreshes prices and sweeps alerts.
    pub refresh_interval_seconds: u64,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// User whose alerts the background sweep evaluates.
    pub default_user: String,
}

impl Settings {
    /// Load settings from defaults overridden by `TLD_MONITOR__*` environment
    /// variables (e.g. `TLD_MONITOR__UPSTREAM__BASE_URL`).
    pub fn new() -> Result<Self, AppError> {
        let config = Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default(
                "upstream.base_url",
                "https://tld-price-changes-api.vercel.app/api",
            )?
            .set_default("upstream.timeout_seconds", 10)?
            .set_default("upstream.cache_ttl_seconds", 3600)?
            .set_default("upstream.rate_limit_retry_seconds", 5)?
            .set_default("monitoring.aggregation_interval_seconds", 60)?
            .set_default("monitoring.refresh_interval_seconds", 300)?
            .set_default("monitoring.version", env!("CARGO_PKG_VERSION"))?
            .set_default("notifications.default_user", "default")?
            .add_source(Environment::with_prefix("TLD_MONITOR").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
