//! USD→NGN exchange rate with a linear source waterfall and a TTL cache.
//!
//! The waterfall tries each configured HTTP source in order and falls back
//! to a hardcoded rate when everything is down, so rate resolution never
//! fails. The cache lives inside the service (injected wherever it's
//! needed), not in a module-level global, so tests and multi-instance
//! deployments each get their own.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Last-resort rate when every external source is unreachable.
pub const FALLBACK_RATE: f64 = 1650.0;
pub const FALLBACK_SOURCE: &str = "Budpay Fallback Rate";

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct Rate {
    pub rate: f64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// One external rate API. `json_path` walks the response object to the
/// NGN rate, e.g. `["rates", "NGN"]`.
#[derive(Debug, Clone)]
pub struct RateSource {
    pub name: String,
    pub url: String,
    pub json_path: Vec<String>,
}

pub struct RateService {
    client: reqwest::Client,
    sources: Vec<RateSource>,
    ttl: Duration,
    cache: Mutex<Option<Rate>>,
}

impl RateService {
    pub fn new(sources: Vec<RateSource>, ttl: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            sources,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// The default production waterfall: two public rate APIs, then the
    /// hardcoded fallback.
    pub fn with_default_sources(ttl: Duration) -> Self {
        Self::new(
            vec![
                RateSource {
                    name: "exchangerate-api".into(),
                    url: "https://api.exchangerate-api.com/v4/latest/USD".into(),
                    json_path: vec!["rates".into(), "NGN".into()],
                },
                RateSource {
                    name: "open-er-api".into(),
                    url: "https://open.er-api.com/v6/latest/USD".into(),
                    json_path: vec!["rates".into(), "NGN".into()],
                },
            ],
            ttl,
        )
    }

    /// Resolve the USD→NGN rate. Never fails: serves from cache inside the
    /// TTL window, otherwise walks the waterfall and caches whatever it
    /// resolved (fallback included, to bound retry storms while sources
    /// are down).
    pub async fn usd_to_ngn(&self) -> Rate {
        if let Some(cached) = self.cached() {
            return cached;
        }

        let resolved = self.fetch_waterfall().await;

        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(resolved.clone());
        }
        resolved
    }

    fn cached(&self) -> Option<Rate> {
        let cache = self.cache.lock().ok()?;
        let rate = cache.as_ref()?;
        let age = Utc::now().signed_duration_since(rate.fetched_at);
        if age.to_std().ok()? < self.ttl {
            Some(rate.clone())
        } else {
            None
        }
    }

    async fn fetch_waterfall(&self) -> Rate {
        for source in &self.sources {
            match self.fetch_one(source).await {
                Ok(rate) => {
                    debug!("Resolved USD/NGN = {} via {}", rate, source.name);
                    return Rate {
                        rate,
                        source: source.name.clone(),
                        fetched_at: Utc::now(),
                    };
                }
                Err(e) => {
                    warn!("Rate source {} failed: {}", source.name, e);
                }
            }
        }

        warn!("All rate sources failed, using fallback {}", FALLBACK_RATE);
        Rate {
            rate: FALLBACK_RATE,
            source: FALLBACK_SOURCE.to_string(),
            fetched_at: Utc::now(),
        }
    }

    async fn fetch_one(&self, source: &RateSource) -> Result<f64, String> {
        let body: serde_json::Value = self
            .client
            .get(&source.url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?
            .json()
            .await
            .map_err(|e| e.to_string())?;

        let mut node = &body;
        for key in &source.json_path {
            node = node
                .get(key)
                .ok_or_else(|| format!("missing key '{}' in response", key))?;
        }

        let rate = node
            .as_f64()
            .ok_or_else(|| format!("rate is not a number: {}", node))?;
        if rate <= 0.0 {
            return Err(format!("implausible rate {}", rate));
        }
        Ok(rate)
    }
}

/// USD cents → NGN kobo at the given rate.
pub fn convert_usd_cents_to_kobo(amount_cents: i64, rate: f64) -> i64 {
    (amount_cents as f64 * rate).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_when_no_sources_resolve() {
        // No sources configured — the waterfall exhausts immediately
        let service = RateService::new(vec![], DEFAULT_TTL);
        let rate = service.usd_to_ngn().await;
        assert_eq!(rate.rate, FALLBACK_RATE);
        assert_eq!(rate.source, FALLBACK_SOURCE);
    }

    #[tokio::test]
    async fn serves_from_cache_within_ttl() {
        let service = RateService::new(vec![], DEFAULT_TTL);
        let first = service.usd_to_ngn().await;
        let second = service.usd_to_ngn().await;
        // Identical timestamp proves the second call never hit the waterfall
        assert_eq!(first.fetched_at, second.fetched_at);
    }

    #[tokio::test]
    async fn expired_cache_is_refetched() {
        let service = RateService::new(vec![], Duration::from_secs(0));
        let first = service.usd_to_ngn().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = service.usd_to_ngn().await;
        assert!(second.fetched_at > first.fetched_at);
    }

    #[test]
    fn kobo_conversion_rounds_to_nearest() {
        // $100.00 at 1650 NGN/USD = 16,500,000 kobo
        assert_eq!(convert_usd_cents_to_kobo(10_000, 1650.0), 16_500_000);
        assert_eq!(convert_usd_cents_to_kobo(1, 1650.5), 1651);
    }
}
