//! Gesotown offers and the salmon run monthly gear.

use futures::future::join_all;
use serde_json::Value;

use ikabot_core::gear::{GearDiff, GearItem, Gesotown, Locale, coop_monthly_gear};
use ikabot_core::schedule::{UNKNOWN, format_mmdd_hhmm, image_url};

use super::{EmbedSpec, ImageRef, Payload, PayloadBuilder, PayloadContext, PayloadError};
use crate::api::Endpoint;
use crate::render::{GearCell, GearCollage};

const GEAR_COLOR: u32 = 0x4CAF50;
const MONTHLY_COLOR: u32 = 0xFF8C00;
const NEW_MARK: &str = "**[New]**";
const NONE_TEXT: &str = "なし";

async fn render_collage(cx: &PayloadContext<'_>, title: &str, items: &[GearItem]) -> Option<Vec<u8>> {
    if items.is_empty() {
        return None;
    }
    let thumbnails = join_all(items.iter().map(|item| async move {
        match &item.image_url {
            Some(url) => cx.source.fetch_image(url).await,
            None => None,
        }
    }))
    .await;

    let cells = items
        .iter()
        .zip(thumbnails)
        .map(|(item, thumbnail)| GearCell {
            label: item.name.clone(),
            thumbnail,
            brand_logo: item.brand_logo.clone(),
            nameplate: cx.assets.random_nameplate(),
        })
        .collect();
    cx.renderer
        .gear_collage(GearCollage {
            title: title.to_string(),
            cells,
        })
        .await
}

/// Limited offers: removed, new, and everything on sale.
pub async fn rotation(cx: &PayloadContext<'_>, gesotown: &Gesotown, diff: &GearDiff) -> Payload {
    let items = &gesotown.limited_items;
    let is_new = |item: &GearItem| diff.added.contains(&item.key());

    let mut embed = EmbedSpec::new("【販売ギア入れ替わり】", GEAR_COLOR);
    if !diff.removed.is_empty() {
        let lines: Vec<String> = diff.removed.iter().map(|item| item.label()).collect();
        embed = embed.field("販売終了ギア", lines.join("\n"), false);
    }
    let added: Vec<String> = items
        .iter()
        .filter(|item| is_new(item))
        .map(|item| format!("{NEW_MARK}{}", item.label()))
        .collect();
    if !added.is_empty() {
        embed = embed.field("新販売ギア", added.join("\n"), false);
    }
    let on_sale = if items.is_empty() {
        NONE_TEXT.to_string()
    } else {
        items
            .iter()
            .map(|item| {
                if is_new(item) {
                    format!("{NEW_MARK}{}", item.label())
                } else {
                    item.label()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    embed = embed.field("販売中ギア", on_sale, false);

    let mut builder = PayloadBuilder::new();
    if let Some(png) = render_collage(cx, "販売中ギア", items).await {
        embed = embed.image(Some(builder.attach_card("gear_limited", png)));
    }
    builder.embed(embed);
    builder.build()
}

/// The pickup brand and its offers.
pub async fn pickup(cx: &PayloadContext<'_>, gesotown: &Gesotown, locale: &Locale) -> Payload {
    let pickup = &gesotown.pickup;
    let brand = pickup.get("brand").unwrap_or(&Value::Null);
    let power = brand.get("usualGearPower").unwrap_or(&Value::Null);
    let sale_end = pickup
        .get("saleEndTime")
        .and_then(Value::as_str)
        .and_then(|raw| format_mmdd_hhmm(raw, cx.zone))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let items = &gesotown.pickup_items;
    let listed = if items.is_empty() {
        NONE_TEXT.to_string()
    } else {
        items
            .iter()
            .map(GearItem::label)
            .collect::<Vec<_>>()
            .join("\n")
    };
    let mut embed = EmbedSpec::new("【ピックアップ更新】", GEAR_COLOR)
        .field(
            "注目ブランド",
            format!(
                "{}\n得意ギアパワー: {}\n期間: {sale_end}まで",
                locale.brand_name(brand),
                locale.power_name(power)
            ),
            false,
        )
        .field("ピックアップ", listed, false);

    let mut builder = PayloadBuilder::new();
    if let Some(png) = render_collage(cx, "ピックアップ", items).await {
        embed = embed.image(Some(builder.attach_card("gear_pickup", png)));
    }
    builder.embed(embed);
    builder.build()
}

/// Fetch and normalize the gesotown section.
pub async fn fetch_gesotown(cx: &PayloadContext<'_>) -> Result<(Gesotown, std::sync::Arc<Locale>), PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::Gear)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    let locale = cx.source.locale().await;
    let gesotown =
        Gesotown::from_doc(&doc, &locale, cx.assets.brand_dir()).ok_or(PayloadError::NoGear)?;
    Ok((gesotown, locale))
}

/// `/gear`: everything on sale plus the pickup, without a diff.
pub async fn gesotown(cx: &PayloadContext<'_>) -> Result<Payload, PayloadError> {
    let (gesotown, locale) = fetch_gesotown(cx).await?;
    let mut payload = rotation(cx, &gesotown, &GearDiff::default()).await;
    payload.merge(pickup(cx, &gesotown, &locale).await);
    Ok(payload)
}

pub fn monthly(monthly: &Value, locale: &Locale) -> Payload {
    let embed = EmbedSpec::new("【サーモンラン報酬ギア更新】", MONTHLY_COLOR)
        .field("ギア", locale.gear_name(monthly), true)
        .thumbnail(image_url(monthly).map(|url| ImageRef::Url(url.to_string())));
    Payload {
        embeds: vec![embed],
        attachments: Vec::new(),
    }
}

pub async fn current_monthly(cx: &PayloadContext<'_>) -> Result<Payload, PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::Coop)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    let locale = cx.source.locale().await;
    let gear = coop_monthly_gear(&doc).unwrap_or(&Value::Null);
    Ok(monthly(gear, &locale))
}
