//! Normalization of upstream schedule documents.
//!
//! The schedule APIs are owned by third parties and their shapes drift:
//! a rule may be an object or a bare string, stage lists may be missing,
//! timestamps come in snake or camel case. Everything here reads
//! `serde_json::Value` leniently and falls back to [`UNKNOWN`].

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde_json::Value;

/// Sentinel shown wherever upstream data is missing.
pub const UNKNOWN: &str = "不明";

/// The four match modes of the stage schedule, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Regular,
    BankaraChallenge,
    BankaraOpen,
    X,
}

impl MatchMode {
    pub const ALL: [MatchMode; 4] = [
        MatchMode::Regular,
        MatchMode::BankaraChallenge,
        MatchMode::BankaraOpen,
        MatchMode::X,
    ];

    /// Key under `result` in the schedule document.
    pub fn key(&self) -> &'static str {
        match self {
            MatchMode::Regular => "regular",
            MatchMode::BankaraChallenge => "bankara_challenge",
            MatchMode::BankaraOpen => "bankara_open",
            MatchMode::X => "x",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MatchMode::Regular => "ナワバリバトル",
            MatchMode::BankaraChallenge => "バンカラマッチ (チャレンジ)",
            MatchMode::BankaraOpen => "バンカラマッチ (オープン)",
            MatchMode::X => "Xマッチ",
        }
    }

    /// Name of the local icon image for the mode.
    pub fn icon_name(&self) -> &'static str {
        match self {
            MatchMode::Regular => "ナワバリバトル",
            MatchMode::BankaraChallenge | MatchMode::BankaraOpen => "バンカラマッチ",
            MatchMode::X => "Xマッチ",
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            MatchMode::Regular => 0x19FF19,
            MatchMode::BankaraChallenge | MatchMode::BankaraOpen => 0xFF3B30,
            MatchMode::X => 0x33CCFF,
        }
    }
}

/// Time zone used to render upstream timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// `None` or an out-of-range offset means system local time.
    pub fn from_offset_hours(hours: Option<i32>) -> Self {
        hours
            .and_then(|h| FixedOffset::east_opt(h * 3600))
            .map(DisplayZone::Fixed)
            .unwrap_or(DisplayZone::Local)
    }

    pub fn localize(&self, dt: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            DisplayZone::Local => dt.with_timezone(&Local).naive_local(),
            DisplayZone::Fixed(offset) => dt.with_timezone(offset).naive_local(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.localize(&Utc::now().fixed_offset())
    }
}

/// Parse an RFC 3339 timestamp (`Z` suffix accepted).
pub fn parse_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw).ok()
}

pub fn format_hhmm(raw: &str, zone: DisplayZone) -> Option<String> {
    parse_time(raw).map(|dt| zone.localize(&dt).format("%H:%M").to_string())
}

pub fn format_mmdd_hhmm(raw: &str, zone: DisplayZone) -> Option<String> {
    parse_time(raw).map(|dt| zone.localize(&dt).format("%m/%d %H:%M").to_string())
}

/// Name of an object-or-string value, or [`UNKNOWN`].
pub fn name_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => UNKNOWN.to_string(),
    }
}

pub fn rule_name(item: &Value) -> String {
    name_of(item.get("rule"))
}

/// Stage names of an item; `[不明, 不明]` when the list is missing or empty.
pub fn stage_names(item: &Value) -> Vec<String> {
    match item.get("stages").and_then(Value::as_array) {
        Some(stages) if !stages.is_empty() => stages.iter().map(|s| name_of(Some(s))).collect(),
        _ => vec![UNKNOWN.to_string(), UNKNOWN.to_string()],
    }
}

/// First two stage names, padded with [`UNKNOWN`].
pub fn stage_pair(item: &Value) -> (String, String) {
    let mut names = stage_names(item).into_iter();
    let first = names.next().unwrap_or_else(|| UNKNOWN.to_string());
    let second = names.next().unwrap_or_else(|| UNKNOWN.to_string());
    (first, second)
}

/// Weapon names of a salmon run item. Unknown shapes are skipped.
pub fn weapon_names(item: &Value) -> Vec<String> {
    item.get("weapons")
        .and_then(Value::as_array)
        .map(|weapons| {
            weapons
                .iter()
                .filter_map(|w| match w {
                    Value::Object(_) => Some(name_of(Some(w))),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn time_field<'a>(item: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    item.get(snake)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| item.get(camel).and_then(Value::as_str))
}

pub fn start_time_raw(item: &Value) -> Option<&str> {
    time_field(item, "start_time", "startTime")
}

pub fn end_time_raw(item: &Value) -> Option<&str> {
    time_field(item, "end_time", "endTime")
}

pub fn item_window(item: &Value) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let start = parse_time(start_time_raw(item)?)?;
    let end = parse_time(end_time_raw(item)?)?;
    Some((start, end))
}

/// First item with `start <= now < end`. Items with unparsable times are skipped.
pub fn find_current(items: &[Value], now: DateTime<Utc>) -> Option<&Value> {
    items.iter().find(|item| {
        item_window(item).is_some_and(|(start, end)| start <= now && now < end)
    })
}

/// First item that has not ended yet.
pub fn find_upcoming(items: &[Value], now: DateTime<Utc>) -> Option<&Value> {
    items.iter().find(|item| {
        end_time_raw(item)
            .and_then(parse_time)
            .is_some_and(|end| now < end)
    })
}

/// `HH:MM～HH:MM`, each side falling back to [`UNKNOWN`].
pub fn format_range_hhmm(item: &Value, zone: DisplayZone) -> String {
    let start = start_time_raw(item).and_then(|raw| format_hhmm(raw, zone));
    let end = end_time_raw(item).and_then(|raw| format_hhmm(raw, zone));
    format_range(start, end)
}

/// `MM/DD HH:MM～MM/DD HH:MM`, each side falling back to [`UNKNOWN`].
pub fn format_range_mmdd(item: &Value, zone: DisplayZone) -> String {
    let start = start_time_raw(item).and_then(|raw| format_mmdd_hhmm(raw, zone));
    let end = end_time_raw(item).and_then(|raw| format_mmdd_hhmm(raw, zone));
    format_range(start, end)
}

fn format_range(start: Option<String>, end: Option<String>) -> String {
    format!(
        "{}～{}",
        start.as_deref().unwrap_or(UNKNOWN),
        end.as_deref().unwrap_or(UNKNOWN)
    )
}

/// `results` array of a yuu26 schedule document.
pub fn results(doc: &Value) -> &[Value] {
    doc.get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Items of one match mode in the stage schedule document.
pub fn mode_items(doc: &Value, mode: MatchMode) -> &[Value] {
    doc.get("result")
        .and_then(|r| r.get(mode.key()))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Rotation key of the stage schedule: start time of the first turf war slot.
pub fn stage_rotation_key(doc: &Value) -> Option<String> {
    mode_items(doc, MatchMode::Regular)
        .first()
        .and_then(start_time_raw)
        .map(str::to_string)
}

/// Number of schedule slots across all modes.
pub fn stage_slot_count(doc: &Value) -> usize {
    MatchMode::ALL
        .iter()
        .map(|mode| mode_items(doc, *mode).len())
        .max()
        .unwrap_or(0)
}

/// Japanese splatfest records from the festivals document.
pub fn fest_records(doc: &Value) -> &[Value] {
    doc.pointer("/JP/data/festRecords/nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn current_fest(doc: &Value, now: DateTime<Utc>) -> Option<&Value> {
    find_current(fest_records(doc), now)
}

pub fn fest_team_names(record: &Value) -> Vec<String> {
    record
        .get("teams")
        .and_then(Value::as_array)
        .map(|teams| {
            teams
                .iter()
                .filter_map(|t| t.get("teamName").and_then(Value::as_str))
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `image.url` of a record, if any.
pub fn image_url(value: &Value) -> Option<&str> {
    value
        .get("image")
        .and_then(|img| img.get("url"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
