pub mod alert;
pub mod metrics;
pub mod notification;
pub mod price_change;

pub use alert::*;
pub use metrics::*;
pub use notification::*;
pub use price_change::*;
