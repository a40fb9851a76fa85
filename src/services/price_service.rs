use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{PriceAlert, PriceChange, PricePoint};
use crate::services::mock_data;
use crate::services::monitoring_service::MonitoringService;
use crate::services::notification_service::NotificationService;

struct PriceCache {
    /// Most recent observation per TLD, keyed by lowercased TLD.
    entries: HashMap<String, PriceChange>,
    /// Staleness clock for the cache as a whole; `None` until the first
    /// successful fetch.
    last_updated: Option<Instant>,
}

impl PriceCache {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.entries.is_empty()
            && self
                .last_updated
                .map_or(false, |updated| updated.elapsed() < ttl)
    }

    fn sorted_values(&self) -> Vec<PriceChange> {
        let mut values: Vec<PriceChange> = self.entries.values().cloned().collect();
        values.sort_by(|a, b| a.tld.cmp(&b.tld));
        values
    }
}

/// Single access point for price data. Hides upstream failure behind the
/// cache (seeded with static fallback data), deduplicates requests via a
/// global TTL, and retries rate-limited requests once after a fixed delay.
pub struct PriceService {
    client: reqwest::Client,
    base_url: String,
    cache_ttl: Duration,
    rate_limit_retry: Duration,
    cache: RwLock<PriceCache>,
    monitoring: Arc<MonitoringService>,
    notifications: Arc<NotificationService>,
}

/// One entry in a price comparison, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedPrice {
    pub tld: String,
    pub price: Option<f64>,
    pub from_cache: bool,
}

#[derive(Debug, Deserialize)]
struct PriceQuote {
    price: f64,
}

impl PriceService {
    pub fn new(
        settings: &Settings,
        monitoring: Arc<MonitoringService>,
        notifications: Arc<NotificationService>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.upstream.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Url::parse(&settings.upstream.base_url)
            .map_err(|e| AppError::Config(format!("Invalid upstream base URL: {}", e)))?;

        let entries = mock_data::price_changes()
            .into_iter()
            .map(|change| (cache_key(&change.tld), change))
            .collect();

        Ok(Self {
            client,
            base_url: settings.upstream.base_url.trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(settings.upstream.cache_ttl_seconds),
            rate_limit_retry: Duration::from_secs(settings.upstream.rate_limit_retry_seconds),
            cache: RwLock::new(PriceCache {
                entries,
                last_updated: None,
            }),
            monitoring,
            notifications,
        })
    }

    /// All tracked price changes. Serves the cache while fresh; otherwise
    /// refreshes from upstream, degrading to the cache contents on any
    /// failure or empty payload. Never errors.
    pub async fn get_price_changes(&self) -> Vec<PriceChange> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh(self.cache_ttl) {
                let timer = self.monitoring.start_request();
                let values = cache.sorted_values();
                timer.success(true);
                return values;
            }
        }

        match self.fetch_price_changes().await {
            Ok(changes) if !changes.is_empty() => {
                let mut cache = self.cache.write().await;
                cache.entries = changes
                    .iter()
                    .map(|change| (cache_key(&change.tld), change.clone()))
                    .collect();
                cache.last_updated = Some(Instant::now());
                info!(count = changes.len(), "Refreshed price cache from upstream");
                changes
            }
            Ok(_) => {
                warn!("Upstream returned no price changes, serving cached data");
                self.cache.read().await.sorted_values()
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch price changes, serving cached data");
                self.cache.read().await.sorted_values()
            }
        }
    }

    /// The cached observation for one TLD, if tracked. Case-insensitive.
    pub async fn get_price_change(&self, tld: &str) -> Option<PriceChange> {
        self.cache
            .read()
            .await
            .entries
            .get(&cache_key(tld))
            .cloned()
    }

    /// Case-insensitive substring search over TLD names. Upstream first,
    /// cache filter on empty or failed response.
    pub async fn search_tld(&self, query: &str) -> Vec<PriceChange> {
        match self.fetch_search(query).await {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => self.filter_cache(query).await,
            Err(err) => {
                warn!(error = %err, query, "TLD search failed, filtering cached data");
                self.filter_cache(query).await
            }
        }
    }

    /// Price history for one TLD. A successful fetch replaces the cached
    /// entity's history; failure returns whatever history the cache holds.
    pub async fn get_price_history(&self, tld: &str) -> Vec<PricePoint> {
        match self.fetch_history(tld).await {
            Ok(history) => {
                let mut cache = self.cache.write().await;
                if let Some(entry) = cache.entries.get_mut(&cache_key(tld)) {
                    entry.history = history.clone();
                }
                history
            }
            Err(err) => {
                warn!(error = %err, tld, "Failed to fetch price history, serving cached history");
                self.cache
                    .read()
                    .await
                    .entries
                    .get(&cache_key(tld))
                    .map(|entry| entry.history.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Attach an alert to a tracked TLD and persist it upstream. Unknown
    /// TLDs are rejected before any network traffic.
    pub async fn set_alert(&self, tld: &str, alert: PriceAlert) -> Result<()> {
        {
            let mut cache = self.cache.write().await;
            let entry = cache
                .entries
                .get_mut(&cache_key(tld))
                .ok_or_else(|| AppError::NotFound(format!("TLD not found: {}", tld)))?;
            entry.alerts.push(alert.clone());
        }

        let mut body = serde_json::to_value(&alert)?;
        if let serde_json::Value::Object(ref mut fields) = body {
            fields.insert("tld".to_string(), serde_json::json!(tld));
        }

        if let Err(err) = self.post_json("alerts", &body).await {
            // The cached alert keeps working offline; the upstream copy is
            // retried implicitly on the next persist.
            warn!(error = %err, tld, "Failed to persist alert upstream");
        }

        Ok(())
    }

    /// Evaluate every enabled alert against the cached observations and hand
    /// matches to the notification evaluator. Returns the dispatch count.
    pub async fn check_alerts(&self, user_id: &str) -> usize {
        let entries = self.cache.read().await.sorted_values();

        let mut dispatched = 0;
        for change in &entries {
            for alert in &change.alerts {
                if alert.enabled && change.should_notify(alert) {
                    self.notifications
                        .process_alert(user_id, change, alert)
                        .await;
                    dispatched += 1;
                }
            }
        }

        info!(user_id, dispatched, "Alert sweep complete");
        dispatched
    }

    /// Current price for each TLD, fetched concurrently. A failing fetch
    /// falls back to that TLD's cached price; output preserves input order.
    pub async fn compare_prices(&self, tlds: &[String]) -> Vec<ComparedPrice> {
        let lookups = tlds.iter().map(|tld| self.current_price(tld));
        join_all(lookups).await
    }

    async fn current_price(&self, tld: &str) -> ComparedPrice {
        match self.fetch_price(tld).await {
            Ok(price) => ComparedPrice {
                tld: tld.to_string(),
                price: Some(price),
                from_cache: false,
            },
            Err(err) => {
                warn!(error = %err, tld, "Failed to fetch current price, using cached value");
                let cached = self
                    .cache
                    .read()
                    .await
                    .entries
                    .get(&cache_key(tld))
                    .map(|entry| entry.new_price);
                ComparedPrice {
                    tld: tld.to_string(),
                    price: cached,
                    from_cache: true,
                }
            }
        }
    }

    async fn filter_cache(&self, query: &str) -> Vec<PriceChange> {
        let needle = query.to_lowercase();
        let cache = self.cache.read().await;
        let mut matches: Vec<PriceChange> = cache
            .entries
            .values()
            .filter(|change| change.tld.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.tld.cmp(&b.tld));
        matches
    }

    async fn fetch_price_changes(&self) -> Result<Vec<PriceChange>> {
        let body = self
            .request_json(self.client.get(self.endpoint("price-changes")))
            .await?;
        parse_price_changes(body)
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<PriceChange>> {
        let request = self
            .client
            .get(self.endpoint("search"))
            .query(&[("tld", query)]);
        let body = self.request_json(request).await?;
        parse_price_changes(body)
    }

    async fn fetch_history(&self, tld: &str) -> Result<Vec<PricePoint>> {
        let body = self
            .request_json(self.client.get(self.endpoint(&format!("history/{}", tld))))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn fetch_price(&self, tld: &str) -> Result<f64> {
        let body = self
            .request_json(self.client.get(self.endpoint(&format!("price/{}", tld))))
            .await?;
        let quote: PriceQuote = serde_json::from_value(body)?;
        Ok(quote.price)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let request = self.client.post(self.endpoint(path)).json(body);
        self.request_json(request).await
    }

    /// Send a request, recording its outcome. A 429 response sleeps for the
    /// configured delay and retries exactly once; no other failure retries.
    async fn request_json(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let retry = request.try_clone();

        match self.execute(request).await {
            Err(AppError::RateLimited) => {
                let Some(retry) = retry else {
                    return Err(AppError::RateLimited);
                };
                warn!(
                    delay_seconds = self.rate_limit_retry.as_secs(),
                    "Rate limited by upstream, retrying once"
                );
                tokio::time::sleep(self.rate_limit_retry).await;
                self.execute(retry).await
            }
            other => other,
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let built = request
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build request: {}", e)))?;
        let url = built.url().to_string();

        let timer = self.monitoring.start_request();
        let result = self.send(built).await;
        match &result {
            Ok(_) => timer.success(false),
            Err(err) => timer.failure(err, &url),
        }
        result
    }

    async fn send(&self, request: reqwest::Request) -> Result<serde_json::Value> {
        let response = self.client.execute(request).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(AppError::UpstreamStatus(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn cache_key(tld: &str) -> String {
    tld.to_lowercase()
}

fn parse_price_changes(body: serde_json::Value) -> Result<Vec<PriceChange>> {
    let raw: Vec<serde_json::Value> = serde_json::from_value(body)?;
    raw.into_iter().map(PriceChange::from_json).collect()
}
