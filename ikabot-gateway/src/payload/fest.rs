//! Splatfest announcements.

use chrono::{DateTime, Utc};
use serde_json::Value;

use ikabot_core::schedule::{
    current_fest, fest_records, fest_team_names, format_range_mmdd, image_url,
};

use super::{EmbedSpec, ImageRef, Payload, PayloadBuilder, PayloadContext, PayloadError, bullet_lines};
use crate::api::Endpoint;

const FEST_COLOR: u32 = 0xFF3D6E;

pub async fn build(cx: &PayloadContext<'_>, record: &Value) -> Payload {
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("フェス");

    let mut embed = EmbedSpec::new("【フェス】", FEST_COLOR)
        .field("フェステーマ", title, false)
        .field("時間", format_range_mmdd(record, cx.zone), true);
    let teams = fest_team_names(record);
    if !teams.is_empty() {
        embed = embed.field("チーム", bullet_lines(&teams), false);
    }
    embed = embed.image(image_url(record).map(|url| ImageRef::Url(url.to_string())));

    let mut builder = PayloadBuilder::new();
    if let Some(path) = cx.assets.image("フェス") {
        embed = embed.thumbnail(builder.attach_file(&path, "fest").await);
    }

    builder.embed(embed);
    builder.build()
}

async fn fetch_doc(cx: &PayloadContext<'_>) -> Result<Value, PayloadError> {
    cx.source
        .fetch_json(Endpoint::Festivals)
        .await
        .ok_or(PayloadError::FetchFailed)
}

/// The running fest only.
pub async fn current(cx: &PayloadContext<'_>, now: DateTime<Utc>) -> Result<Payload, PayloadError> {
    let doc = fetch_doc(cx).await?;
    let record = current_fest(&doc, now).ok_or(PayloadError::NoCurrentFest)?;
    Ok(build(cx, record).await)
}

pub async fn all(cx: &PayloadContext<'_>) -> Result<Vec<Payload>, PayloadError> {
    let doc = fetch_doc(cx).await?;
    let records = fest_records(&doc);
    if records.is_empty() {
        return Err(PayloadError::NoFest);
    }
    let mut payloads = Vec::with_capacity(records.len());
    for record in records {
        payloads.push(build(cx, record).await);
    }
    Ok(payloads)
}
