pub mod alerts;
pub mod notifications;
pub mod prices;
pub mod system;

pub use alerts::create_alert_routes;
pub use notifications::create_notification_routes;
pub use prices::create_price_routes;
pub use system::create_system_routes;

use serde::Serialize;

/// Uniform response envelope for the dashboard API.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }
}
