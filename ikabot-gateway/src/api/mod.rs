//! Upstream schedule APIs.
//!
//! Every fetch either yields a JSON document or "no data". Failures are
//! logged here and never reach command handlers or notifier jobs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use ikabot_core::config::ApiSettings;
use ikabot_core::gear::Locale;
use ikabot_core::schedule::current_fest;

pub mod cache;
mod client;

pub use client::ApiClient;

/// The fixed set of upstream documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Schedule,
    Salmon,
    TeamContest,
    Event,
    Gear,
    Coop,
    Festivals,
    XRank,
    Locale,
}

impl Endpoint {
    pub fn url(self, api: &ApiSettings) -> &str {
        match self {
            Endpoint::Schedule => &api.schedule_url,
            Endpoint::Salmon => &api.salmon_url,
            Endpoint::TeamContest => &api.team_contest_url,
            Endpoint::Event => &api.event_url,
            Endpoint::Gear => &api.gear_url,
            Endpoint::Coop => &api.coop_url,
            Endpoint::Festivals => &api.festivals_url,
            Endpoint::XRank => &api.xrank_url,
            Endpoint::Locale => &api.locale_url,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Schedule => "schedule",
            Endpoint::Salmon => "salmon",
            Endpoint::TeamContest => "team_contest",
            Endpoint::Event => "event",
            Endpoint::Gear => "gear",
            Endpoint::Coop => "coop",
            Endpoint::Festivals => "festivals",
            Endpoint::XRank => "xrank",
            Endpoint::Locale => "locale",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid JSON: {0}")]
    Decode(String),
}

/// Source of upstream documents.
///
/// [`ApiClient`] is the HTTP implementation; tests provide fixtures.
#[async_trait::async_trait]
pub trait ScheduleSource: Send + Sync {
    /// The document behind `endpoint`, or `None` on any failure.
    async fn fetch_json(&self, endpoint: Endpoint) -> Option<Value>;

    /// Raw bytes of a remote image, or `None` on any failure.
    async fn fetch_image(&self, url: &str) -> Option<Vec<u8>>;

    /// The ja-JP locale table. Empty when it cannot be fetched.
    async fn locale(&self) -> Arc<Locale>;

    /// Whether a splatfest is running at `now`. Unknown counts as no.
    async fn is_fest_active(&self, now: DateTime<Utc>) -> bool {
        match self.fetch_json(Endpoint::Festivals).await {
            Some(doc) => current_fest(&doc, now).is_some(),
            None => false,
        }
    }
}
