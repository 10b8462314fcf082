//! Notification ticks against fixture documents and an in-memory sink.

mod common;

use std::sync::atomic::Ordering;

use chrono::{DateTime, TimeZone, Utc};

use common::{
    STAGE_CHANNEL, coop_doc, fest_doc, gear_doc, harness, notify_env, salmon_doc, schedule_doc,
};
use ikabot_core::Feature;
use ikabot_gateway::api::Endpoint;
use ikabot_gateway::notify::{Job, NotifyError, TickOutcome};

fn noon() -> DateTime<Utc> {
    // 2024-05-01 12:00 JST
    Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()
}

#[tokio::test]
async fn test_stage_first_observation_is_silent_then_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00"),
    );

    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Persisted);
    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Unchanged);
    assert!(h.sink.sent.lock().unwrap().is_empty());

    let state = h.notifier.state().store.load().await;
    assert_eq!(state.last_key(Feature::Stage), Some("2024-05-01T11:00:00+09:00"));
}

#[tokio::test]
async fn test_stage_rotation_replaces_previous_message() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T09:00:00+09:00", "2024-05-01T11:00:00+09:00"),
    );
    h.notifier.tick(Job::Stage, noon()).await.unwrap();

    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00"),
    );
    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Sent);
    assert!(h.sink.deleted.lock().unwrap().is_empty());

    let titles = h.sink.sent_titles();
    assert_eq!(titles, vec![(STAGE_CHANNEL, "【ナワバリバトル】".to_string())]);
    assert_eq!(h.sink.last_payload().embeds.len(), 4);
    let first_id = h.sink.sent.lock().unwrap()[0].1;

    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T13:00:00+09:00", "2024-05-01T15:00:00+09:00"),
    );
    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(*h.sink.deleted.lock().unwrap(), vec![(STAGE_CHANNEL, first_id)]);

    let second_id = h.sink.sent.lock().unwrap()[1].1;
    let state = h.notifier.state().store.load().await;
    assert_eq!(state.last_message_id(Feature::Stage), Some(second_id));
}

#[tokio::test]
async fn test_restart_does_not_repeat_announcement() {
    let dir = tempfile::tempdir().unwrap();
    let doc = schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00");

    let h = harness(dir.path(), notify_env(&[Feature::Stage]));
    h.source.set(Endpoint::Schedule, doc.clone());
    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Sent);

    let restarted = harness(dir.path(), notify_env(&[Feature::Stage]));
    restarted.source.set(Endpoint::Schedule, doc);
    assert_eq!(
        restarted.notifier.tick(Job::Stage, noon()).await.unwrap(),
        TickOutcome::Unchanged
    );
    assert!(restarted.sink.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_send_is_retried_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[Feature::Salmon]));
    h.source.set(
        Endpoint::Salmon,
        salmon_doc("2024-05-01T09:00:00+09:00", "2024-05-02T01:00:00+09:00"),
    );

    h.sink.failing.store(true, Ordering::SeqCst);
    let err = h.notifier.tick(Job::Salmon, noon()).await.unwrap_err();
    assert!(matches!(err, NotifyError::Sink(_)));

    h.sink.failing.store(false, Ordering::SeqCst);
    assert_eq!(h.notifier.tick(Job::Salmon, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.notifier.tick(Job::Salmon, noon()).await.unwrap(), TickOutcome::Unchanged);
    assert_eq!(
        h.sink.sent_titles(),
        vec![(STAGE_CHANNEL, "【サーモンラン】".to_string())]
    );
}

#[tokio::test]
async fn test_feature_channel_wins_over_stage_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[Feature::Salmon]));
    h.source.set(
        Endpoint::Salmon,
        salmon_doc("2024-05-01T09:00:00+09:00", "2024-05-02T01:00:00+09:00"),
    );
    h.notifier
        .state()
        .store
        .update(|state| state.entry(Feature::Salmon).channel_id = Some(555))
        .await
        .unwrap();

    assert_eq!(h.notifier.tick(Job::Salmon, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.sink.sent_titles()[0].0, 555);
}

#[tokio::test]
async fn test_no_current_shift_is_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(
        Endpoint::Salmon,
        salmon_doc("2024-05-03T09:00:00+09:00", "2024-05-04T01:00:00+09:00"),
    );
    assert_eq!(h.notifier.tick(Job::Salmon, noon()).await.unwrap(), TickOutcome::NoData);
    assert_eq!(h.notifier.tick(Job::Event, noon()).await.unwrap(), TickOutcome::NoData);
}

#[tokio::test]
async fn test_fest_pauses_other_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[Feature::Fest]));
    h.source.set(
        Endpoint::Festivals,
        fest_doc("2024-05-01T09:00:00+09:00", "2024-05-03T09:00:00+09:00"),
    );
    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00"),
    );

    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::FestPaused);
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::FestPaused);
    assert_eq!(h.notifier.tick(Job::Fest, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.notifier.tick(Job::Fest, noon()).await.unwrap(), TickOutcome::Unchanged);
    assert_eq!(h.sink.sent_titles(), vec![(STAGE_CHANNEL, "【フェス】".to_string())]);
}

#[tokio::test]
async fn test_held_lock_skips_tick() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[Feature::Stage]));
    h.source.set(
        Endpoint::Schedule,
        schedule_doc("2024-05-01T11:00:00+09:00", "2024-05-01T13:00:00+09:00"),
    );

    let paths = &h.notifier.state().settings.paths;
    let lock_dir = paths.resolve(&paths.lock_dir);
    let guard = ikabot_core::acquire_lock(&lock_dir, "stage", std::time::Duration::from_secs(120))
        .unwrap()
        .unwrap();

    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Locked);
    // Other jobs use their own lock.
    assert_eq!(h.notifier.tick(Job::Salmon, noon()).await.unwrap(), TickOutcome::NoData);

    drop(guard);
    assert_eq!(h.notifier.tick(Job::Stage, noon()).await.unwrap(), TickOutcome::Sent);
}

#[tokio::test]
async fn test_gear_diff_announces_new_offers() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(Endpoint::Gear, gear_doc(&[("Alpha", 1000), ("Beta", 2000)], "Zink"));

    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Persisted);
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Unchanged);

    h.source.set(Endpoint::Gear, gear_doc(&[("Beta", 2000), ("Gamma", 3000)], "Zink"));
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Sent);

    // Pickup unchanged: only the rotation embed.
    let sent = h.sink.sent_titles();
    assert_eq!(sent, vec![(STAGE_CHANNEL, "【販売ギア入れ替わり】".to_string())]);
    let embed = &h.sink.last_payload().embeds[0];
    assert_eq!(embed.field_value("販売終了ギア"), Some("Alpha (1000G)"));
    assert_eq!(embed.field_value("新販売ギア"), Some("**[New]**Gamma (3000G)"));

    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Unchanged);

    h.source.set(Endpoint::Gear, gear_doc(&[("Beta", 2000), ("Gamma", 3000)], "Forge"));
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.sink.sent_titles()[1].1, "【ピックアップ更新】");
}

#[tokio::test]
async fn test_coop_monthly_change_is_announced_once() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(Endpoint::Coop, coop_doc("m1"));

    // No gesotown data: only the monthly gear is tracked.
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::NoData);
    assert!(h.sink.sent.lock().unwrap().is_empty());

    h.source.set(Endpoint::Coop, coop_doc("m2"));
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.notifier.tick(Job::Gear, noon()).await.unwrap(), TickOutcome::NoData);
    assert_eq!(
        h.sink.sent_titles(),
        vec![(STAGE_CHANNEL, "【サーモンラン報酬ギア更新】".to_string())]
    );

    let state = h.notifier.state().store.load().await;
    assert_eq!(state.last_key(Feature::CoopMonthly), Some("m2"));
}

#[tokio::test]
async fn test_xrank_posts_once_after_midnight_of_final_day() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), notify_env(&[]));
    h.source.set(
        Endpoint::XRank,
        serde_json::json!({"data": {"xRanking": {"currentSeason": {
            "name": "Fresh Season 2024",
            "endTime": "2024-06-01T08:00:00+09:00",
            "lastUpdateTime": "2024-05-31T23:00:00+09:00",
            "xRankingAr": {"nodes": [{"rank": 1, "name": "ika", "xPower": 3100.0}]}
        }}}}),
    );

    // 2024-05-31 23:59 JST: wrong day
    let before = Utc.with_ymd_and_hms(2024, 5, 31, 14, 59, 0).unwrap();
    assert_eq!(h.notifier.tick(Job::XRank, before).await.unwrap(), TickOutcome::Unchanged);

    // 2024-06-01 00:03 JST
    let window = Utc.with_ymd_and_hms(2024, 5, 31, 15, 3, 0).unwrap();
    assert_eq!(h.notifier.tick(Job::XRank, window).await.unwrap(), TickOutcome::Sent);
    assert_eq!(h.notifier.tick(Job::XRank, window).await.unwrap(), TickOutcome::Unchanged);

    let payload = h.sink.last_payload();
    assert!(payload.attachment("xrank_top100.txt").is_some());

    let state = h.notifier.state().store.load().await;
    assert_eq!(state.last_key(Feature::XRank), Some("2024-06-01"));
}
