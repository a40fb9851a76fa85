pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use error::types::*;

use std::sync::Arc;
use std::time::Duration;

use config::Settings;
use services::{MonitoringService, NotificationService, PriceService};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub price_service: Arc<PriceService>,
    pub notification_service: Arc<NotificationService>,
    pub monitoring_service: Arc<MonitoringService>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let monitoring_service = Arc::new(MonitoringService::new(
            &settings.monitoring.version,
            Duration::from_secs(settings.monitoring.aggregation_interval_seconds),
        ));
        let notification_service = Arc::new(NotificationService::new());
        let price_service = Arc::new(PriceService::new(
            &settings,
            Arc::clone(&monitoring_service),
            Arc::clone(&notification_service),
        )?);

        Ok(Self {
            settings,
            price_service,
            notification_service,
            monitoring_service,
        })
    }
}
