//! X ranking leaderboard text.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::schedule::{DisplayZone, UNKNOWN, format_mmdd_hhmm, parse_time};

const MODES: [(&str, &str); 4] = [
    ("xRankingAr", "ガチエリア"),
    ("xRankingCl", "ガチアサリ"),
    ("xRankingGl", "ガチホコ"),
    ("xRankingLf", "ガチヤグラ"),
];

pub const ATTACHMENT_NAME: &str = "xrank_top100.txt";

/// Minutes after local midnight during which the daily post may go out.
const DAILY_WINDOW_MINUTES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRankText {
    pub text: String,
    /// `MM/DD HH:MM` of the last upstream update, or [`UNKNOWN`]
    pub last_update: String,
}

fn current_season(doc: &Value) -> Option<&Value> {
    doc.pointer("/data/xRanking/currentSeason")
}

fn power_text(power: Option<&Value>) -> String {
    match power {
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|p| format!("{p:.1}"))
            .unwrap_or_else(|| n.to_string()),
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    }
}

fn rank_text(rank: Option<&Value>) -> String {
    match rank {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    }
}

/// Build the leaderboard text: season header, then the top `top_n` of
/// each mode.
pub fn build_text(doc: &Value, top_n: usize, zone: DisplayZone) -> XRankText {
    let season = current_season(doc).unwrap_or(&Value::Null);
    let season_name = season
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Xランキング");
    let last_update = season
        .get("lastUpdateTime")
        .and_then(Value::as_str)
        .and_then(|raw| format_mmdd_hhmm(raw, zone))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let mut lines = vec![
        season_name.to_string(),
        format!("更新: {last_update}"),
        String::new(),
    ];
    for (key, label) in MODES {
        lines.push(format!("■ {label}"));
        let nodes = season
            .get(key)
            .and_then(|m| m.get("nodes"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for node in nodes.iter().take(top_n) {
            let name = node
                .get("name")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("?");
            lines.push(format!(
                "{}. {} ({})",
                rank_text(node.get("rank")),
                name,
                power_text(node.get("xPower"))
            ));
        }
        lines.push(String::new());
    }

    XRankText {
        text: lines.join("\n").trim().to_string(),
        last_update,
    }
}

/// Local end time of the current season.
pub fn season_end(doc: &Value, zone: DisplayZone) -> Option<NaiveDateTime> {
    current_season(doc)
        .and_then(|s| s.get("endTime"))
        .and_then(Value::as_str)
        .and_then(parse_time)
        .map(|end| zone.localize(&end))
}

/// Date key to record when the daily post is due, `None` otherwise.
///
/// The post goes out on the season's final day, in the first minutes after
/// local midnight, at most once per date.
pub fn daily_post_due(
    now: NaiveDateTime,
    season_end: NaiveDateTime,
    last_sent_date: Option<&str>,
) -> Option<String> {
    use chrono::Timelike;

    if now.date() != season_end.date() {
        return None;
    }
    if now.hour() != 0 || now.minute() > DAILY_WINDOW_MINUTES {
        return None;
    }
    let today = now.format("%Y-%m-%d").to_string();
    if last_sent_date == Some(today.as_str()) {
        return None;
    }
    Some(today)
}
