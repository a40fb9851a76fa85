use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::models::{
    NotificationChannel, NotificationPayload, NotificationPreferences, NotificationPriority,
    PriceAlert, PriceChange,
};
use crate::utils::format::format_currency;

/// Per-user notification preferences and alert delivery. Email and push are
/// log-only stubs; in-app notifications accumulate in a pending queue until
/// the dashboard drains them.
pub struct NotificationService {
    preferences: RwLock<HashMap<String, NotificationPreferences>>,
    pending: RwLock<Vec<NotificationPayload>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self {
            preferences: RwLock::new(HashMap::new()),
            pending: RwLock::new(Vec::new()),
        }
    }

    /// Preferences for a user; unset users inherit the defaults.
    pub async fn preferences(&self, user_id: &str) -> NotificationPreferences {
        self.preferences
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrites the user's preferences wholesale.
    pub async fn set_preferences(&self, user_id: &str, prefs: NotificationPreferences) {
        self.preferences
            .write()
            .await
            .insert(user_id.to_string(), prefs);
    }

    /// Evaluate one triggered alert for a user: build the payload, then either
    /// queue it (quiet hours) or deliver it to each enabled channel.
    pub async fn process_alert(
        &self,
        user_id: &str,
        price_change: &PriceChange,
        alert: &PriceAlert,
    ) {
        let prefs = self.preferences(user_id).await;
        let payload = build_payload(price_change, alert, Utc::now());

        if in_quiet_hours(&prefs, Utc::now()) {
            info!(user_id, tld = %price_change.tld, "Notification queued - within quiet hours");
            self.pending.write().await.push(payload);
            return;
        }

        for channel in &alert.notify_via {
            if !prefs.channel_enabled(*channel) {
                continue;
            }
            self.deliver(*channel, payload.clone()).await;
        }
    }

    pub async fn pending_notifications(&self) -> Vec<NotificationPayload> {
        self.pending.read().await.clone()
    }

    pub async fn clear_notifications(&self) {
        self.pending.write().await.clear();
    }

    async fn deliver(&self, channel: NotificationChannel, payload: NotificationPayload) {
        match channel {
            NotificationChannel::Email => {
                // External email delivery is out of scope.
                info!(title = %payload.title, "Sending email notification");
            }
            NotificationChannel::Push => {
                // External push delivery is out of scope.
                info!(title = %payload.title, "Sending push notification");
            }
            NotificationChannel::InApp => {
                self.pending.write().await.push(payload);
            }
        }
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `now` falls inside the user's quiet-hours window.
fn in_quiet_hours(prefs: &NotificationPreferences, now: DateTime<Utc>) -> bool {
    prefs
        .quiet_hours
        .as_ref()
        .map_or(false, |window| window.contains(now))
}

fn build_payload(
    price_change: &PriceChange,
    alert: &PriceAlert,
    now: DateTime<Utc>,
) -> NotificationPayload {
    let change_kind = if price_change.price_change < 0.0 {
        "decreased"
    } else {
        "increased"
    };
    let amount = price_change.price_change.abs();
    let percent = price_change.percentage_change.abs();

    let mut data = HashMap::new();
    data.insert("tld".to_string(), serde_json::json!(price_change.tld));
    data.insert(
        "oldPrice".to_string(),
        serde_json::json!(price_change.old_price),
    );
    data.insert(
        "newPrice".to_string(),
        serde_json::json!(price_change.new_price),
    );
    data.insert("alertType".to_string(), serde_json::json!(alert.rule.tag()));

    NotificationPayload {
        title: format!("Price {} for {}", change_kind, price_change.tld),
        body: format!(
            "The price has {} by {} ({:.1}%)",
            change_kind,
            format_currency(amount),
            percent
        ),
        data: Some(data),
        timestamp: now,
        kind: "price_alert".to_string(),
        priority: if percent >= 10.0 {
            NotificationPriority::High
        } else if percent >= 5.0 {
            NotificationPriority::Normal
        } else {
            NotificationPriority::Low
        },
    }
}
