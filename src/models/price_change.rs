use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::alert::{AlertRule, PriceAlert};
use crate::utils::format::format_date_long;
use crate::utils::math;

/// One historical price observation for a TLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(default = "default_source")]
    pub source: String,
}

/// A TLD price observation as tracked by the dashboard. Entities are treated as
/// immutable by consumers; updates replace the cached entry for the TLD.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub tld: String,
    pub old_price: f64,
    pub new_price: f64,
    pub price_change: f64,
    pub percentage_change: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_count: Option<u64>,
    #[serde(default)]
    pub history: Vec<PricePoint>,
    #[serde(default)]
    pub alerts: Vec<PriceAlert>,
    #[serde(default = "Utc::now")]
    pub last_checked: DateTime<Utc>,
    #[serde(default = "default_next_check")]
    pub next_check: DateTime<Utc>,
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    pub date: String,
    pub price: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalytics {
    pub min_price: f64,
    pub max_price: f64,
    pub mean_price: f64,
    pub volatility: f64,
    pub trend: TrendDirection,
    pub confidence: f64,
}

impl PriceChange {
    /// Build an entity from an untyped API payload. Optional fields receive
    /// defaults; a payload missing a required field is a parse error.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Projection of the current observation for charting.
    pub fn to_chart_data_point(&self) -> ChartDataPoint {
        ChartDataPoint {
            date: format_date_long(self.date),
            price: self.new_price,
            source: self.primary_source().to_string(),
        }
    }

    /// Historical points plus the current observation, ascending by date.
    pub fn history_chart_data(&self) -> Vec<ChartDataPoint> {
        let mut points: Vec<(NaiveDate, f64, String)> = self
            .history
            .iter()
            .map(|p| (p.date, p.price, p.source.clone()))
            .collect();
        points.push((self.date, self.new_price, self.primary_source().to_string()));
        points.sort_by_key(|(date, _, _)| *date);

        points
            .into_iter()
            .map(|(date, price, source)| ChartDataPoint {
                date: format_date_long(date),
                price,
                source,
            })
            .collect()
    }

    /// Summary statistics over the merged history (historical points plus the
    /// current observation).
    pub fn analytics(&self) -> PriceAnalytics {
        let prices: Vec<f64> = self
            .history_series()
            .into_iter()
            .map(|(_, price)| price)
            .collect();

        let min_price = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean_price = math::mean(&prices);
        let volatility = math::std_deviation(&prices);

        // Trend compares the first and last of the final three samples.
        let window = if prices.len() > 3 {
            &prices[prices.len() - 3..]
        } else {
            &prices[..]
        };
        let trend = match (window.first(), window.last()) {
            (Some(first), Some(last)) if last > first => TrendDirection::Up,
            (Some(first), Some(last)) if last < first => TrendDirection::Down,
            _ => TrendDirection::Stable,
        };

        // More history and lower dispersion both raise confidence.
        let length_score = (prices.len() as f64 / 30.0).min(1.0);
        let volatility_score = 1.0 / (1.0 + volatility);
        let confidence = (0.5 * length_score + 0.5 * volatility_score).clamp(0.0, 1.0);

        PriceAnalytics {
            min_price,
            max_price,
            mean_price,
            volatility,
            trend,
            confidence,
        }
    }

    /// Whether this observation should trigger the given alert.
    pub fn should_notify(&self, alert: &PriceAlert) -> bool {
        if !alert.enabled {
            return false;
        }

        match &alert.rule {
            AlertRule::PriceDrop { percentage } => {
                self.price_change < 0.0
                    && percentage.map_or(true, |p| self.percentage_change.abs() >= p)
            }
            AlertRule::PriceIncrease { percentage } => {
                self.price_change > 0.0
                    && percentage.map_or(true, |p| self.percentage_change.abs() >= p)
            }
            // Crossing check kept exactly as the dashboard shipped it.
            AlertRule::Threshold { value } => {
                self.new_price <= *value || self.old_price > *value
            }
        }
    }

    /// Estimated renewal revenue impact across the registered domain base.
    pub fn additional_revenue(&self) -> f64 {
        self.domain_count
            .map_or(0.0, |count| self.price_change * count as f64)
    }

    fn primary_source(&self) -> &str {
        self.sources.first().map(String::as_str).unwrap_or("default")
    }

    fn history_series(&self) -> Vec<(NaiveDate, f64)> {
        let mut series: Vec<(NaiveDate, f64)> = self
            .history
            .iter()
            .map(|p| (p.date, p.price))
            .collect();
        series.push((self.date, self.new_price));
        series.sort_by_key(|(date, _)| *date);
        series
    }
}

fn default_next_check() -> DateTime<Utc> {
    Utc::now() + Duration::hours(24)
}

fn default_sources() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_source() -> String {
    "default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alert::NotificationChannel;
    use proptest::prelude::*;

    fn fixture(tld: &str, old_price: f64, new_price: f64) -> PriceChange {
        let price_change = new_price - old_price;
        PriceChange {
            id: Uuid::new_v4(),
            tld: tld.to_string(),
            old_price,
            new_price,
            price_change,
            percentage_change: price_change / old_price * 100.0,
            date: NaiveDate::from_ymd_opt(2024, 10, 4).unwrap(),
            domain_count: None,
            history: Vec::new(),
            alerts: Vec::new(),
            last_checked: Utc::now(),
            next_check: Utc::now() + Duration::hours(24),
            sources: vec!["default".to_string()],
            metadata: None,
        }
    }

    fn point(year: i32, month: u32, day: u32, price: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            price,
            source: "registry".to_string(),
        }
    }

    fn drop_alert(percentage: Option<f64>) -> PriceAlert {
        PriceAlert::new(
            AlertRule::PriceDrop { percentage },
            vec![NotificationChannel::InApp],
        )
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let entity = PriceChange::from_json(serde_json::json!({
            "tld": ".com",
            "oldPrice": 10.0,
            "newPrice": 12.0,
            "priceChange": 2.0,
            "percentageChange": 20.0,
            "date": "2024-10-04"
        }))
        .unwrap();

        assert_eq!(entity.tld, ".com");
        assert!(entity.history.is_empty());
        assert!(entity.alerts.is_empty());
        assert_eq!(entity.sources, vec!["default".to_string()]);
        let deferred = entity.next_check - entity.last_checked;
        assert_eq!(deferred.num_hours(), 24);
    }

    #[test]
    fn test_from_json_rejects_missing_price() {
        let result = PriceChange::from_json(serde_json::json!({
            "tld": ".com",
            "oldPrice": 10.0,
            "date": "2024-10-04"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_chart_data_point() {
        let mut entity = fixture(".ai", 120.0, 140.0);
        entity.sources = vec!["registry".to_string(), "mirror".to_string()];

        let point = entity.to_chart_data_point();
        assert_eq!(point.date, "October 4, 2024");
        assert_eq!(point.price, 140.0);
        assert_eq!(point.source, "registry");
    }

    #[test]
    fn test_history_chart_data_is_ascending_and_includes_current() {
        let mut entity = fixture(".ai", 120.0, 140.0);
        entity.history = vec![
            point(2023, 4, 15, 120.0),
            point(2022, 1, 1, 100.0),
        ];

        let chart = entity.history_chart_data();
        assert_eq!(chart.len(), 3);
        assert_eq!(chart[0].price, 100.0);
        assert_eq!(chart[1].price, 120.0);
        assert_eq!(chart[2].price, 140.0);
        assert_eq!(chart[2].date, "October 4, 2024");
    }

    #[test]
    fn test_analytics_flat_history() {
        let mut entity = fixture(".org", 10.0, 10.0);
        entity.history = vec![
            point(2024, 1, 1, 10.0),
            point(2024, 2, 1, 10.0),
            point(2024, 3, 1, 10.0),
        ];

        let analytics = entity.analytics();
        assert_eq!(analytics.volatility, 0.0);
        assert_eq!(analytics.trend, TrendDirection::Stable);
        assert_eq!(analytics.min_price, 10.0);
        assert_eq!(analytics.max_price, 10.0);
        assert_eq!(analytics.mean_price, 10.0);
        assert!(analytics.confidence > 0.0 && analytics.confidence <= 1.0);
    }

    #[test]
    fn test_analytics_trend_uses_last_three_samples() {
        let mut entity = fixture(".app", 12.0, 14.0);
        entity.history = vec![
            point(2024, 1, 1, 20.0),
            point(2024, 2, 1, 10.0),
            point(2024, 3, 1, 12.0),
        ];

        // Last three samples are 10, 12, 14: rising despite the early 20.
        assert_eq!(entity.analytics().trend, TrendDirection::Up);
    }

    #[test]
    fn test_analytics_single_point() {
        let entity = fixture(".dev", 10.0, 12.0);
        let analytics = entity.analytics();
        assert_eq!(analytics.volatility, 0.0);
        assert_eq!(analytics.trend, TrendDirection::Stable);
    }

    #[test]
    fn test_should_notify_price_drop() {
        let entity = fixture(".com", 100.0, 90.0); // -10%
        assert!(entity.should_notify(&drop_alert(Some(5.0))));

        let small = fixture(".com", 100.0, 97.0); // -3%
        assert!(!small.should_notify(&drop_alert(Some(5.0))));

        // No percentage set: any drop fires.
        assert!(small.should_notify(&drop_alert(None)));

        // Increases never fire a drop alert.
        let rise = fixture(".com", 100.0, 110.0);
        assert!(!rise.should_notify(&drop_alert(None)));
    }

    #[test]
    fn test_should_notify_disabled_alert() {
        let entity = fixture(".com", 100.0, 90.0);
        let mut alert = drop_alert(Some(5.0));
        alert.enabled = false;
        assert!(!entity.should_notify(&alert));
    }

    #[test]
    fn test_should_notify_price_increase() {
        let entity = fixture(".com", 100.0, 112.0); // +12%
        let alert = PriceAlert::new(
            AlertRule::PriceIncrease {
                percentage: Some(10.0),
            },
            vec![NotificationChannel::Email],
        );
        assert!(entity.should_notify(&alert));

        let modest = fixture(".com", 100.0, 105.0); // +5%
        assert!(!modest.should_notify(&alert));
    }

    #[test]
    fn test_should_notify_threshold_crossing() {
        let alert = PriceAlert::new(
            AlertRule::Threshold { value: 50.0 },
            vec![NotificationChannel::InApp],
        );

        // Now at/below the threshold fires.
        assert!(fixture(".com", 60.0, 40.0).should_notify(&alert));
        // Was above the threshold fires even though price rose further.
        assert!(fixture(".com", 60.0, 70.0).should_notify(&alert));
        // Never above and still below the threshold also fires (new <= value).
        assert!(fixture(".com", 40.0, 45.0).should_notify(&alert));
        // The one silent case: started at/below, ended above.
        assert!(!fixture(".com", 45.0, 55.0).should_notify(&alert));
    }

    #[test]
    fn test_additional_revenue() {
        let mut entity = fixture(".app", 12.0, 14.0);
        assert_eq!(entity.additional_revenue(), 0.0);

        entity.domain_count = Some(456_321);
        assert!((entity.additional_revenue() - 912_642.0).abs() < 1e-6);
    }

    proptest! {
        // Fixture consistency: derived deltas always satisfy the entity
        // invariants consumers rely on.
        #[test]
        fn prop_fixture_invariants(old_price in 0.01f64..10_000.0, new_price in 0.0f64..10_000.0) {
            let entity = fixture(".test", old_price, new_price);
            prop_assert!((entity.price_change - (entity.new_price - entity.old_price)).abs() < 1e-9);
            let expected_pct = entity.price_change / entity.old_price * 100.0;
            prop_assert!((entity.percentage_change - expected_pct).abs() < 1e-9);
        }
    }
}
