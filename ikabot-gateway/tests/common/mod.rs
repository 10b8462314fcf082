//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use ikabot_core::config::Settings;
use ikabot_core::gear::Locale;
use ikabot_core::{Feature, NotifyEnv};
use ikabot_gateway::api::{Endpoint, ScheduleSource};
use ikabot_gateway::assets::Assets;
use ikabot_gateway::notify::{MessageSink, Notifier, SinkError};
use ikabot_gateway::payload::Payload;
use ikabot_gateway::render::{FontSet, Renderer};
use ikabot_gateway::state::AppState;

/// Upstream documents served from memory.
#[derive(Default)]
pub struct FixtureSource {
    docs: Mutex<HashMap<Endpoint, Value>>,
}

impl FixtureSource {
    pub fn set(&self, endpoint: Endpoint, doc: Value) {
        self.docs.lock().unwrap().insert(endpoint, doc);
    }
}

#[async_trait::async_trait]
impl ScheduleSource for FixtureSource {
    async fn fetch_json(&self, endpoint: Endpoint) -> Option<Value> {
        self.docs.lock().unwrap().get(&endpoint).cloned()
    }

    async fn fetch_image(&self, _url: &str) -> Option<Vec<u8>> {
        None
    }

    async fn locale(&self) -> Arc<Locale> {
        Arc::new(Locale::default())
    }
}

/// Records every send and delete instead of talking to Discord.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(u64, u64, Payload)>>,
    pub deleted: Mutex<Vec<(u64, u64)>>,
    pub failing: AtomicBool,
    next_id: AtomicU64,
}

impl RecordingSink {
    pub fn sent_titles(&self) -> Vec<(u64, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(channel, _, payload)| (*channel, payload.embeds[0].title.clone()))
            .collect()
    }

    pub fn last_payload(&self) -> Payload {
        self.sent.lock().unwrap().last().unwrap().2.clone()
    }
}

#[async_trait::async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, channel_id: u64, payload: &Payload) -> Result<u64, SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Discord("Missing Access".to_string()));
        }
        let id = 1000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((channel_id, id, payload.clone()));
        Ok(id)
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), SinkError> {
        self.deleted.lock().unwrap().push((channel_id, message_id));
        Ok(())
    }
}

pub const STAGE_CHANNEL: u64 = 100;

pub fn notify_env(announce_on_start: &[Feature]) -> NotifyEnv {
    NotifyEnv {
        channels: [(Feature::Stage, STAGE_CHANNEL)].into_iter().collect(),
        announce_on_start: announce_on_start.iter().copied().collect(),
        activity_name: "Splatoon".to_string(),
    }
}

pub fn build_state(dir: &Path, env: NotifyEnv, source: Arc<FixtureSource>) -> Arc<AppState> {
    let mut settings = Settings::default();
    settings.paths.base_dir = Some(dir.to_path_buf());
    settings.display.utc_offset_hours = Some(9);

    let assets = Assets::from_settings(&settings.paths);
    let renderer = Renderer::new(FontSet::system());
    Arc::new(AppState::new(settings, env, source, assets, renderer))
}

pub struct Harness {
    pub source: Arc<FixtureSource>,
    pub sink: Arc<RecordingSink>,
    pub notifier: Notifier,
}

pub fn harness(dir: &Path, env: NotifyEnv) -> Harness {
    let source = Arc::new(FixtureSource::default());
    let sink = Arc::new(RecordingSink::default());
    let state = build_state(dir, env, Arc::clone(&source));
    let notifier = Notifier::new(state, sink.clone());
    Harness {
        source,
        sink,
        notifier,
    }
}

/// Stage schedule whose first turf war slot starts at `start`.
pub fn schedule_doc(start: &str, end: &str) -> Value {
    let slot = |rule: &str| {
        json!({
            "start_time": start,
            "end_time": end,
            "rule": {"name": rule},
            "stages": [{"name": "ユノハナ大渓谷"}, {"name": "ゴンズイ地区"}]
        })
    };
    json!({"result": {
        "regular": [slot("ナワバリバトル")],
        "bankara_challenge": [slot("ガチエリア")],
        "bankara_open": [slot("ガチヤグラ")],
        "x": [slot("ガチホコバトル")]
    }})
}

pub fn salmon_doc(start: &str, end: &str) -> Value {
    json!({"results": [{
        "start_time": start,
        "end_time": end,
        "boss": {"name": "ヨコヅナ"},
        "stage": {"name": "シェケナダム"},
        "weapons": [{"name": "スプラシューター"}, {"name": "わかばシューター"}]
    }]})
}

pub fn fest_doc(start: &str, end: &str) -> Value {
    json!({"JP": {"data": {"festRecords": {"nodes": [{
        "title": "どっちが好き?",
        "startTime": start,
        "endTime": end,
        "teams": [{"teamName": "きのこ"}, {"teamName": "たけのこ"}]
    }]}}}})
}

pub fn gear_doc(limited: &[(&str, u32)], brand: &str) -> Value {
    let limited: Vec<Value> = limited
        .iter()
        .map(|(name, price)| json!({"price": price, "gear": {"name": name, "__splatoon3ink_id": name}}))
        .collect();
    json!({"data": {"gesotown": {
        "pickupBrand": {
            "brand": {"name": brand, "__splatoon3ink_id": brand},
            "saleEndTime": "2024-05-02T00:00:00Z",
            "brandGears": [{"price": 900, "gear": {"name": format!("{brand} Cap"), "__splatoon3ink_id": format!("{brand}-cap")}}]
        },
        "limitedGears": limited
    }}})
}

pub fn coop_doc(monthly_id: &str) -> Value {
    json!({"data": {"coopResult": {"monthlyGear": {
        "__splatoon3ink_id": monthly_id,
        "name": monthly_id
    }}}})
}
