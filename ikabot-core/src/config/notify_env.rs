//! Notification routing read from the environment.
//!
//! Channel ids set here are fallbacks: a channel chosen with a
//! `*_notify_here` command is stored in the notify state and wins.

use std::collections::{BTreeMap, BTreeSet};
use std::env;

use crate::feature::Feature;

const DEFAULT_ACTIVITY_NAME: &str = "Splatoon";

#[derive(Debug, Clone, Default)]
pub struct NotifyEnv {
    /// `<PREFIX>_NOTIFY_CHANNEL_ID` values that parsed to a non-zero id
    pub channels: BTreeMap<Feature, u64>,
    /// Features whose `<PREFIX>_NOTIFY_ON_START` is `1`
    pub announce_on_start: BTreeSet<Feature>,
    /// Presence text (env: BOT_ACTIVITY_NAME)
    pub activity_name: String,
}

impl NotifyEnv {
    pub fn from_env() -> Self {
        let mut channels = BTreeMap::new();
        let mut announce_on_start = BTreeSet::new();

        for feature in Feature::ALL {
            if let Some(id) = env::var(feature.channel_env_var())
                .ok()
                .and_then(|raw| parse_channel_id(&raw))
            {
                channels.insert(feature, id);
            }

            let flag = feature
                .on_start_env_var()
                .and_then(|name| env::var(name).ok())
                .is_some_and(|raw| raw.trim() == "1");
            if flag {
                announce_on_start.insert(feature);
            }
        }

        let activity_name = env::var("BOT_ACTIVITY_NAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTIVITY_NAME.to_string());

        Self {
            channels,
            announce_on_start,
            activity_name,
        }
    }

    pub fn channel(&self, feature: Feature) -> Option<u64> {
        self.channels.get(&feature).copied()
    }

    pub fn announces_on_start(&self, feature: Feature) -> bool {
        self.announce_on_start.contains(&feature)
    }
}

fn parse_channel_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}
