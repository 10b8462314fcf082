//! Salmon run and team contest shifts.

use serde_json::Value;

use ikabot_core::schedule::{UNKNOWN, format_range_mmdd, name_of, results, weapon_names};

use super::{EmbedSpec, Payload, PayloadBuilder, PayloadContext, PayloadError, bullet_lines};
use crate::api::Endpoint;
use crate::assets::RANDOM_WEAPON;
use crate::render::SalmonCard;

const SALMON_COLOR: u32 = 0xFF8C00;
const TEAM_CONTEST_COLOR: u32 = 0xFFB000;

fn is_big_run(item: &Value) -> bool {
    item.get("is_big_run")
        .or_else(|| item.get("isBigRun"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub async fn build_salmon(cx: &PayloadContext<'_>, item: &Value) -> Payload {
    let stage = name_of(item.get("stage"));
    let boss = name_of(item.get("boss"));
    let weapons = weapon_names(item);

    let mut embed = EmbedSpec::new("【サーモンラン】", SALMON_COLOR)
        .field("時間", format_range_mmdd(item, cx.zone), true)
        .field("ステージ", format!("**{stage}**"), true)
        .field("オカシラ", format!("**{boss}**"), true);
    if is_big_run(item) {
        embed = embed.field("ビッグラン", "開催中", true);
    }
    if !weapons.is_empty() {
        embed = embed.field("ブキ", bullet_lines(&weapons), false);
    }

    let mut builder = PayloadBuilder::new();
    let stage_path = cx.assets.image(&stage);
    let weapon_icons = weapons
        .iter()
        .filter(|name| name.as_str() != UNKNOWN)
        .filter_map(|name| cx.assets.weapon(name))
        .collect();
    let card = cx
        .renderer
        .salmon_card(SalmonCard {
            stage_image: stage_path.clone(),
            weapon_icons,
        })
        .await;
    embed = match (card, stage_path) {
        (Some(png), _) => embed.image(Some(builder.attach_card("salmon", png))),
        (None, Some(path)) => embed.image(builder.attach_file(&path, "salmon_stage").await),
        (None, None) => embed,
    };

    let thumbnail = match cx.assets.image(&boss) {
        Some(path) => builder.attach_file(&path, "salmon_boss").await,
        None if weapons.iter().any(|w| w == RANDOM_WEAPON) => match cx.assets.weapon(RANDOM_WEAPON) {
            Some(path) => builder.attach_file(&path, "salmon_random").await,
            None => None,
        },
        None => None,
    };
    embed = embed.thumbnail(thumbnail);

    if let Some(path) = cx.assets.image("サーモンラン") {
        let icon = builder.attach_file(&path, "salmon").await;
        embed = embed.footer("SALMON RUN", icon);
    }

    builder.embed(embed);
    builder.build()
}

async fn fetch_results(cx: &PayloadContext<'_>, endpoint: Endpoint) -> Result<Vec<Value>, PayloadError> {
    let doc = cx
        .source
        .fetch_json(endpoint)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    Ok(results(&doc).to_vec())
}

/// The first listed shift.
pub async fn current_salmon(cx: &PayloadContext<'_>) -> Result<Payload, PayloadError> {
    let items = fetch_results(cx, Endpoint::Salmon).await?;
    let item = items.first().ok_or(PayloadError::NoSalmon)?;
    Ok(build_salmon(cx, item).await)
}

pub async fn all_salmon(cx: &PayloadContext<'_>) -> Result<Vec<Payload>, PayloadError> {
    let items = fetch_results(cx, Endpoint::Salmon).await?;
    if items.is_empty() {
        return Err(PayloadError::NoSalmon);
    }
    let mut payloads = Vec::with_capacity(items.len());
    for item in &items {
        payloads.push(build_salmon(cx, item).await);
    }
    Ok(payloads)
}

pub async fn build_team_contest(cx: &PayloadContext<'_>, item: &Value) -> Payload {
    let stage = name_of(item.get("stage"));
    let boss = name_of(item.get("boss"));
    let weapons = weapon_names(item);

    let mut embed = EmbedSpec::new("【バイトチームコンテスト】", TEAM_CONTEST_COLOR)
        .field("時間", format_range_mmdd(item, cx.zone), true)
        .field("ステージ", format!("**{stage}**"), true);
    if boss != UNKNOWN {
        embed = embed.field("オカシラ", format!("**{boss}**"), true);
    }
    if !weapons.is_empty() {
        embed = embed.field("ブキ", bullet_lines(&weapons), false);
    }

    let mut builder = PayloadBuilder::new();
    if let Some(path) = cx.assets.image(&stage) {
        embed = embed.image(builder.attach_file(&path, "team_stage").await);
    }
    if let Some(path) = cx.assets.image(&boss) {
        embed = embed.thumbnail(builder.attach_file(&path, "team_boss").await);
    }
    if let Some(path) = cx.assets.image("バイトチームコンテスト") {
        let icon = builder.attach_file(&path, "team").await;
        embed = embed.footer("TEAM CONTEST", icon);
    }

    builder.embed(embed);
    builder.build()
}

pub async fn team_contest(cx: &PayloadContext<'_>) -> Result<Payload, PayloadError> {
    let items = fetch_results(cx, Endpoint::TeamContest).await?;
    let item = items.first().ok_or(PayloadError::NoTeamContest)?;
    Ok(build_team_contest(cx, item).await)
}
