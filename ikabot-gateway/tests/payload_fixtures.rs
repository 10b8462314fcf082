//! Payload building from recorded upstream documents.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use common::{FixtureSource, build_state, fest_doc, gear_doc, notify_env, salmon_doc, schedule_doc};
use ikabot_gateway::api::Endpoint;
use ikabot_gateway::payload::{self, PayloadError};

#[tokio::test]
async fn test_stage_payload_has_one_embed_per_mode() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::default());
    source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00"),
    );
    let state = build_state(dir.path(), notify_env(&[]), source);
    let cx = state.payload_context();

    let payload = payload::stages::at_index(&cx, 0).await.unwrap();
    let titles: Vec<&str> = payload.embeds.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "【ナワバリバトル】",
            "【バンカラマッチ (チャレンジ)】",
            "【バンカラマッチ (オープン)】",
            "【Xマッチ】"
        ]
    );
    let regular = &payload.embeds[0];
    assert_eq!(regular.field_value("時間"), Some("11:00～13:00"));
    assert_eq!(regular.field_value("ルール"), Some("**ナワバリバトル**"));
    assert_eq!(
        regular.field_value("ステージ"),
        Some("1. ユノハナ大渓谷\n2. ゴンズイ地区")
    );

    // Only one slot is known: the next slot has no information.
    let next = payload::stages::at_index(&cx, 1).await.unwrap();
    assert_eq!(next.embeds[0].description.as_deref(), Some("情報がありません。"));

    let all = payload::stages::all(&cx).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_missing_documents_map_to_user_errors() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::default());
    source.set(Endpoint::Schedule, json!({"result": {}}));
    source.set(Endpoint::Salmon, json!({"results": []}));
    let state = build_state(dir.path(), notify_env(&[]), source);
    let cx = state.payload_context();

    assert_eq!(payload::stages::all(&cx).await.unwrap_err(), PayloadError::NoStages);
    assert_eq!(payload::salmon::current_salmon(&cx).await.unwrap_err(), PayloadError::NoSalmon);
    assert_eq!(payload::event::all(&cx).await.unwrap_err(), PayloadError::FetchFailed);
    assert_eq!(
        PayloadError::FetchFailed.to_string(),
        "データの取得に失敗しました。"
    );
}

#[tokio::test]
async fn test_salmon_payload_lists_weapons() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::default());
    source.set(
        Endpoint::Salmon,
        salmon_doc("2024-05-01T09:00:00+09:00", "2024-05-02T01:00:00+09:00"),
    );
    let state = build_state(dir.path(), notify_env(&[]), source);
    let cx = state.payload_context();

    let payload = payload::salmon::current_salmon(&cx).await.unwrap();
    let embed = &payload.embeds[0];
    assert_eq!(embed.title, "【サーモンラン】");
    assert_eq!(embed.field_value("時間"), Some("05/01 09:00～05/02 01:00"));
    assert_eq!(embed.field_value("ステージ"), Some("**シェケナダム**"));
    assert_eq!(embed.field_value("オカシラ"), Some("**ヨコヅナ**"));
    assert_eq!(
        embed.field_value("ブキ"),
        Some("- スプラシューター\n- わかばシューター")
    );
}

#[tokio::test]
async fn test_fest_current_and_all() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::default());
    source.set(
        Endpoint::Festivals,
        fest_doc("2024-05-01T09:00:00+09:00", "2024-05-03T09:00:00+09:00"),
    );
    let state = build_state(dir.path(), notify_env(&[]), source);
    let cx = state.payload_context();

    let during = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    let payload = payload::fest::current(&cx, during).await.unwrap();
    assert_eq!(payload.embeds[0].field_value("フェステーマ"), Some("どっちが好き?"));
    assert_eq!(payload.embeds[0].field_value("チーム"), Some("- きのこ\n- たけのこ"));

    let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(
        payload::fest::current(&cx, after).await.unwrap_err(),
        PayloadError::NoCurrentFest
    );
    assert_eq!(payload::fest::all(&cx).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_gear_command_merges_rotation_and_pickup() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(FixtureSource::default());
    source.set(Endpoint::Gear, gear_doc(&[("Alpha", 1000)], "Zink"));
    let state = build_state(dir.path(), notify_env(&[]), source);
    let cx = state.payload_context();

    let payload = payload::gear::gesotown(&cx).await.unwrap();
    let titles: Vec<&str> = payload.embeds.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["【販売ギア入れ替わり】", "【ピックアップ更新】"]);
    assert_eq!(payload.embeds[0].field_value("販売中ギア"), Some("Alpha (1000G)"));
    assert_eq!(payload.embeds[0].field_value("新販売ギア"), None);
    assert_eq!(payload.embeds[1].field_value("ピックアップ"), Some("Zink Cap (900G)"));
}
