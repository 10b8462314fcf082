//! Gesotown gear normalization, localization and change detection.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::schedule::{UNKNOWN, image_url};

/// The ja-JP locale table published next to the gear data.
///
/// Entries are looked up as `<category>.<__splatoon3ink_id>.name`.
#[derive(Debug, Clone, Default)]
pub struct Locale(Value);

impl Locale {
    pub fn new(table: Value) -> Self {
        Self(table)
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_none_or(|m| m.is_empty())
    }

    pub fn name(&self, category: &str, key: Option<&str>) -> Option<&str> {
        let key = key.filter(|k| !k.is_empty())?;
        self.0
            .get(category)
            .and_then(|c| c.get(key))
            .and_then(|entry| entry.get("name"))
            .and_then(Value::as_str)
    }

    fn localized(&self, category: &str, key: Option<&str>, record: &Value) -> String {
        self.name(category, key)
            .or_else(|| record.get("name").and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    pub fn gear_name(&self, gear: &Value) -> String {
        self.localized("gear", ink_id(gear), gear)
    }

    pub fn power_name(&self, power: &Value) -> String {
        self.localized("powers", ink_id(power), power)
    }

    pub fn brand_name(&self, brand: &Value) -> String {
        let key = brand.get("id").and_then(Value::as_str).or_else(|| ink_id(brand));
        self.localized("brands", key, brand)
    }
}

fn ink_id(record: &Value) -> Option<&str> {
    record.get("__splatoon3ink_id").and_then(Value::as_str)
}

fn price_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "?".to_string(),
    }
}

/// One gear offer, normalized for display and diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearItem {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub brand_logo: Option<PathBuf>,
}

impl GearItem {
    /// `"{id}:{price}"`; a price change counts as a different offer.
    pub fn key(&self) -> String {
        format!("{}:{}", self.id, self.price)
    }

    /// `name (priceG)`
    pub fn label(&self) -> String {
        format!("{} ({}G)", self.name, self.price)
    }

    pub fn snapshot(&self) -> GearSnapshot {
        GearSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price.clone(),
        }
    }
}

/// What the gear state file remembers about an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearSnapshot {
    pub id: String,
    pub name: String,
    pub price: String,
}

impl GearSnapshot {
    pub fn key(&self) -> String {
        format!("{}:{}", self.id, self.price)
    }

    pub fn label(&self) -> String {
        format!("{} ({}G)", self.name, self.price)
    }
}

/// Normalize `{gear, price}` offer records.
pub fn normalize_items(entries: &[Value], locale: &Locale, brand_dir: &Path) -> Vec<GearItem> {
    entries
        .iter()
        .map(|entry| {
            let gear = entry.get("gear").unwrap_or(&Value::Null);
            let name = locale.gear_name(gear);
            let id = ink_id(gear)
                .or_else(|| gear.get("name").and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| name.clone());
            let brand = gear.get("brand").unwrap_or(&Value::Null);
            GearItem {
                id,
                name,
                price: price_text(entry.get("price")),
                image_url: image_url(gear).map(str::to_string),
                brand_logo: find_brand_logo(brand, locale, brand_dir),
            }
        })
        .collect()
}

/// `<brand_dir>/<localized name>.png`, then the raw upstream name.
pub fn find_brand_logo(brand: &Value, locale: &Locale, brand_dir: &Path) -> Option<PathBuf> {
    let localized = locale.brand_name(brand);
    let raw = brand.get("name").and_then(Value::as_str);

    std::iter::once(localized.as_str())
        .chain(raw)
        .filter(|name| !name.is_empty() && *name != UNKNOWN)
        .map(|name| brand_dir.join(format!("{name}.png")))
        .find(|path| path.is_file())
}

fn digest(parts: impl IntoIterator<Item = String>) -> String {
    let raw = parts.into_iter().collect::<Vec<_>>().join("|");
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Order-independent content signature of a gear list.
pub fn items_signature(items: &[GearItem]) -> String {
    let mut keys: Vec<String> = items.iter().map(GearItem::key).collect();
    keys.sort();
    digest(keys)
}

/// Signature of the pickup brand together with its offers.
pub fn pickup_signature(pickup: &Value, items: &[GearItem]) -> String {
    let brand = pickup.get("brand").unwrap_or(&Value::Null);
    let brand_key = ink_id(brand)
        .or_else(|| brand.get("name").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();
    let mut keys: Vec<String> = items.iter().map(GearItem::key).collect();
    keys.sort();
    digest(std::iter::once(brand_key).chain(keys))
}

/// Difference between the stored snapshot and the current offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GearDiff {
    pub added: HashSet<String>,
    pub removed: Vec<GearSnapshot>,
}

pub fn diff(previous: &[GearSnapshot], current: &[GearItem]) -> GearDiff {
    let prev_keys: HashMap<String, &GearSnapshot> =
        previous.iter().map(|item| (item.key(), item)).collect();
    let cur_keys: HashSet<String> = current.iter().map(GearItem::key).collect();

    let added = cur_keys
        .iter()
        .filter(|key| !prev_keys.contains_key(*key))
        .cloned()
        .collect();
    let removed = previous
        .iter()
        .filter(|item| !cur_keys.contains(&item.key()))
        .cloned()
        .collect();

    GearDiff { added, removed }
}

/// Contents of the gear notification state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearNotifyState {
    #[serde(default)]
    pub limited_sig: Option<String>,
    #[serde(default)]
    pub pickup_sig: Option<String>,
    #[serde(default)]
    pub limited_items: Vec<GearSnapshot>,
    #[serde(default)]
    pub pickup_items: Vec<GearSnapshot>,
}

impl GearNotifyState {
    pub fn is_first_observation(&self) -> bool {
        self.limited_sig.is_none() && self.pickup_sig.is_none()
    }
}

/// The gesotown section of the gear document, normalized.
#[derive(Debug, Clone)]
pub struct Gesotown {
    pub pickup: Value,
    pub pickup_items: Vec<GearItem>,
    pub limited_items: Vec<GearItem>,
}

impl Gesotown {
    pub fn from_doc(doc: &Value, locale: &Locale, brand_dir: &Path) -> Option<Self> {
        let gesotown = doc.pointer("/data/gesotown")?;
        let pickup = gesotown.get("pickupBrand").cloned().unwrap_or(Value::Null);
        let empty = Vec::new();
        let brand_gears = pickup
            .get("brandGears")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let limited = gesotown
            .get("limitedGears")
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        Some(Self {
            pickup_items: normalize_items(brand_gears, locale, brand_dir),
            limited_items: normalize_items(limited, locale, brand_dir),
            pickup,
        })
    }

    pub fn limited_signature(&self) -> String {
        items_signature(&self.limited_items)
    }

    pub fn pickup_signature(&self) -> String {
        pickup_signature(&self.pickup, &self.pickup_items)
    }

    pub fn snapshot_into(&self, state: &mut GearNotifyState) {
        state.limited_sig = Some(self.limited_signature());
        state.pickup_sig = Some(self.pickup_signature());
        state.limited_items = self.limited_items.iter().map(GearItem::snapshot).collect();
        state.pickup_items = self.pickup_items.iter().map(GearItem::snapshot).collect();
    }
}

/// The salmon run monthly reward gear of the coop document.
pub fn coop_monthly_gear(doc: &Value) -> Option<&Value> {
    doc.pointer("/data/coopResult/monthlyGear")
        .filter(|v| v.is_object())
}

/// Identity of the monthly gear used for change detection.
pub fn coop_monthly_id(monthly: &Value) -> Option<String> {
    ink_id(monthly)
        .or_else(|| monthly.get("name").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
