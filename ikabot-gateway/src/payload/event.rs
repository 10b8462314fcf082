//! Challenge (event match) schedule.

use chrono::{DateTime, Utc};
use serde_json::Value;

use ikabot_core::schedule::{
    UNKNOWN, find_current, find_upcoming, format_range_mmdd, results, rule_name, stage_pair,
};

use super::stages::render_card;
use super::{EmbedSpec, Payload, PayloadBuilder, PayloadContext, PayloadError, stage_lines};
use crate::api::Endpoint;

const EVENT_COLOR: u32 = 0xFF69B4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Ongoing,
    Next,
}

impl EventStatus {
    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Ongoing => "開催中",
            EventStatus::Next => "次回",
        }
    }
}

/// The running event, else the next one, else the first listed.
pub fn select(items: &[Value], now: DateTime<Utc>) -> Option<(&Value, Option<EventStatus>)> {
    if let Some(item) = find_current(items, now) {
        return Some((item, Some(EventStatus::Ongoing)));
    }
    if let Some(item) = find_upcoming(items, now) {
        return Some((item, Some(EventStatus::Next)));
    }
    items.first().map(|item| (item, None))
}

fn event_text<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get("event")
        .and_then(|e| e.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub async fn build(cx: &PayloadContext<'_>, item: &Value, status: Option<EventStatus>) -> Payload {
    let rule = rule_name(item);
    let name = event_text(item, "name").unwrap_or(UNKNOWN);
    let (first, second) = stage_pair(item);

    let mut embed = EmbedSpec::new("【イベントマッチ】", EVENT_COLOR)
        .field("時間", format_range_mmdd(item, cx.zone), true)
        .field("イベント", format!("**{name}**"), false);
    if let Some(status) = status {
        embed = embed.description(status.label());
    }
    if let Some(desc) = event_text(item, "desc") {
        embed = embed.field("説明", desc, false);
    }
    embed = embed
        .field("ルール", format!("**{rule}**"), true)
        .field("ステージ", stage_lines(&first, &second), false);

    let mut builder = PayloadBuilder::new();
    if let Some(path) = cx.assets.image("イベントマッチ") {
        embed = embed.thumbnail(builder.attach_file(&path, "event").await);
    }
    embed = match render_card(cx, &rule, (&first, &second)).await {
        Some(png) => embed.image(Some(builder.attach_card("event", png))),
        None => match cx.assets.image(&first) {
            Some(path) => embed.image(builder.attach_file(&path, "event_stage").await),
            None => embed,
        },
    };

    builder.embed(embed);
    builder.build()
}

async fn fetch_items(cx: &PayloadContext<'_>) -> Result<Vec<Value>, PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::Event)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    let items = results(&doc).to_vec();
    if items.is_empty() {
        return Err(PayloadError::NoEvent);
    }
    Ok(items)
}

pub async fn current(cx: &PayloadContext<'_>, now: DateTime<Utc>) -> Result<Payload, PayloadError> {
    let items = fetch_items(cx).await?;
    let (item, status) = select(&items, now).ok_or(PayloadError::NoEvent)?;
    Ok(build(cx, item, status).await)
}

pub async fn all(cx: &PayloadContext<'_>) -> Result<Vec<Payload>, PayloadError> {
    let items = fetch_items(cx).await?;
    let mut payloads = Vec::with_capacity(items.len());
    for item in &items {
        payloads.push(build(cx, item, None).await);
    }
    Ok(payloads)
}
