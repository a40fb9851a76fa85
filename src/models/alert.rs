use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Push,
    InApp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Push => "push",
            NotificationChannel::InApp => "in_app",
        }
    }
}

/// Alert trigger rule. The `type` tag on the wire matches the upstream API
/// (`price_drop` | `price_increase` | `threshold`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertRule {
    PriceDrop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percentage: Option<f64>,
    },
    PriceIncrease {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percentage: Option<f64>,
    },
    Threshold {
        #[serde(rename = "threshold")]
        value: f64,
    },
}

impl AlertRule {
    /// Wire tag of this rule, used in notification payload data.
    pub fn tag(&self) -> &'static str {
        match self {
            AlertRule::PriceDrop { .. } => "price_drop",
            AlertRule::PriceIncrease { .. } => "price_increase",
            AlertRule::Threshold { .. } => "threshold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(flatten)]
    pub rule: AlertRule,
    pub enabled: bool,
    pub notify_via: Vec<NotificationChannel>,
}

impl PriceAlert {
    pub fn new(rule: AlertRule, notify_via: Vec<NotificationChannel>) -> Self {
        Self {
            rule,
            enabled: true,
            notify_via,
        }
    }
}
