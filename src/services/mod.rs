pub mod mock_data;
pub mod monitoring_service;
pub mod notification_service;
pub mod price_service;

pub use monitoring_service::*;
pub use notification_service::*;
pub use price_service::*;
