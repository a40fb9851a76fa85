use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::alert::NotificationChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

/// Transient notification built per alert evaluation; queued, then delivered
/// or discarded. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: NotificationPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryFrequency {
    Instant,
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPreference {
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
    pub enabled: bool,
}

/// Quiet-hours window in the user's local time. Bounds are inclusive and
/// compared directly; a window crossing midnight is not special-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub timezone: Tz,
}

impl QuietHours {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone).time();
        let minutes = |t: NaiveTime| t.hour() * 60 + t.minute();

        minutes(local) >= minutes(self.start) && minutes(local) <= minutes(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub channels: Vec<ChannelPreference>,
    pub frequency: DeliveryFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
}

impl NotificationPreferences {
    pub fn channel_enabled(&self, channel: NotificationChannel) -> bool {
        self.channels
            .iter()
            .any(|pref| pref.channel == channel && pref.enabled)
    }
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            channels: vec![
                ChannelPreference {
                    channel: NotificationChannel::InApp,
                    enabled: true,
                },
                ChannelPreference {
                    channel: NotificationChannel::Email,
                    enabled: false,
                },
                ChannelPreference {
                    channel: NotificationChannel::Push,
                    enabled: false,
                },
            ],
            frequency: DeliveryFrequency::Instant,
            quiet_hours: None,
        }
    }
}

/// Serde adapter for `HH:MM` clock strings.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}
