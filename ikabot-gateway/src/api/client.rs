use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use ikabot_core::config::ApiSettings;
use ikabot_core::gear::Locale;

use super::cache::TimedCache;
use super::{ApiError, Endpoint, ScheduleSource};

/// HTTP client for the schedule APIs.
///
/// One shared `reqwest::Client` carries the user agent and timeout. There is
/// no retry: a failed poll is simply repeated on the next tick.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ApiSettings,
    locale: TimedCache<Arc<Locale>>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            http,
            locale: TimedCache::new(settings.locale_ttl()),
            settings,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl ScheduleSource for ApiClient {
    async fn fetch_json(&self, endpoint: Endpoint) -> Option<Value> {
        let url = endpoint.url(&self.settings);
        match self.get_json(url).await {
            Ok(doc) => {
                debug!("api: fetched {}", endpoint.name());
                Some(doc)
            }
            Err(e) => {
                warn!("api: {} fetch failed: {}", endpoint.name(), e);
                None
            }
        }
    }

    async fn fetch_image(&self, url: &str) -> Option<Vec<u8>> {
        if url.is_empty() {
            return None;
        }
        match self.get_bytes(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("api: image fetch failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn locale(&self) -> Arc<Locale> {
        if let Some(cached) = self.locale.get().await {
            return cached;
        }
        match self.fetch_json(Endpoint::Locale).await {
            Some(table) => {
                let locale = Arc::new(Locale::new(table));
                self.locale.set(Arc::clone(&locale)).await;
                locale
            }
            None => Arc::new(Locale::default()),
        }
    }
}
