//! X ranking leaderboard as a text attachment.

use serde_json::Value;

use ikabot_core::schedule::DisplayZone;
use ikabot_core::xrank::{ATTACHMENT_NAME, build_text};

use super::{EmbedSpec, Payload, PayloadBuilder, PayloadContext, PayloadError};
use crate::api::Endpoint;

const XRANK_COLOR: u32 = 0x4DA3FF;

pub fn build(doc: &Value, top_n: usize, zone: DisplayZone) -> Payload {
    let text = build_text(doc, top_n, zone);
    let mut builder = PayloadBuilder::new();
    builder.attach_bytes(ATTACHMENT_NAME.to_string(), text.text.into_bytes());
    builder.embed(
        EmbedSpec::new("【Xランキング トップ100】", XRANK_COLOR).field("更新", text.last_update, true),
    );
    builder.build()
}

pub async fn current(cx: &PayloadContext<'_>) -> Result<Payload, PayloadError> {
    let doc = cx
        .source
        .fetch_json(Endpoint::XRank)
        .await
        .ok_or(PayloadError::FetchFailed)?;
    Ok(build(&doc, cx.xrank_top_n, cx.zone))
}
