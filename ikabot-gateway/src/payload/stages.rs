//! Battle stage rotations: one embed per match mode.

use serde_json::Value;

use ikabot_core::schedule::{
    MatchMode, format_range_hhmm, mode_items, rule_name, stage_pair, stage_slot_count,
};

use super::{EmbedSpec, Payload, PayloadBuilder, PayloadContext, PayloadError, stage_lines};
use crate::api::Endpoint;
use crate::render::{StageCard, StagePanel};

/// Stage card for `rule` and two stages, or `None` when it cannot be drawn.
pub(crate) async fn render_card(
    cx: &PayloadContext<'_>,
    rule: &str,
    stages: (&str, &str),
) -> Option<Vec<u8>> {
    let panel = |name: &str| StagePanel {
        name: name.to_string(),
        image: cx.assets.image(name),
    };
    cx.renderer
        .stage_card(StageCard {
            rule: rule.to_string(),
            rule_icon: cx.assets.rule_icon(rule),
            stages: [panel(stages.0), panel(stages.1)],
        })
        .await
}

/// Embeds of all modes for the slot at `index`.
pub async fn build(cx: &PayloadContext<'_>, doc: &Value, index: usize) -> Payload {
    let mut builder = PayloadBuilder::new();

    for mode in MatchMode::ALL {
        let title = format!("【{}】", mode.title());
        let icon = match cx.assets.mode_icon(mode) {
            Some(path) => builder.attach_file(&path, "mode").await,
            None => None,
        };

        let Some(item) = mode_items(doc, mode).get(index) else {
            builder.embed(
                EmbedSpec::new(title, mode.color())
                    .description("情報がありません。")
                    .thumbnail(icon),
            );
            continue;
        };

        let rule = rule_name(item);
        let (first, second) = stage_pair(item);
        let mut embed = EmbedSpec::new(title, mode.color())
            .field("時間", format_range_hhmm(item, cx.zone), true)
            .field("ルール", format!("**{rule}**"), true)
            .field("ステージ", stage_lines(&first, &second), false)
            .thumbnail(icon);

        embed = match render_card(cx, &rule, (&first, &second)).await {
            Some(png) => embed.image(Some(builder.attach_card("card", png))),
            None => match cx.assets.image(&first) {
                Some(path) => embed.image(builder.attach_file(&path, "stage").await),
                None => embed,
            },
        };
        builder.embed(embed);
    }

    builder.build()
}

/// `/now` (index 0) and `/next` (index 1).
pub async fn at_index(cx: &PayloadContext<'_>, index: usize) -> Result<Payload, PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::Schedule)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    Ok(build(cx, &doc, index).await)
}

/// One payload per known slot.
pub async fn all(cx: &PayloadContext<'_>) -> Result<Vec<Payload>, PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::Schedule)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    let slots = stage_slot_count(&doc);
    if slots == 0 {
        return Err(PayloadError::NoStages);
    }

    let mut payloads = Vec::with_capacity(slots);
    for index in 0..slots {
        payloads.push(build(cx, &doc, index).await);
    }
    Ok(payloads)
}
