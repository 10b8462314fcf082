//! The catalogue of notification features.
//!
//! Every feature owns a slot in the persisted notify state, an optional
//! `<PREFIX>_NOTIFY_CHANNEL_ID` env override and, for rotation-driven
//! features, a `<PREFIX>_NOTIFY_ON_START` flag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Stage,
    Event,
    Salmon,
    TeamContest,
    Fest,
    Gear,
    CoopMonthly,
    #[serde(rename = "xrank")]
    XRank,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Stage,
        Feature::Event,
        Feature::Salmon,
        Feature::TeamContest,
        Feature::Fest,
        Feature::Gear,
        Feature::CoopMonthly,
        Feature::XRank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Stage => "stage",
            Feature::Event => "event",
            Feature::Salmon => "salmon",
            Feature::TeamContest => "team_contest",
            Feature::Fest => "fest",
            Feature::Gear => "gear",
            Feature::CoopMonthly => "coop_monthly",
            Feature::XRank => "xrank",
        }
    }

    /// Prefix used for the feature's environment variables.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Feature::Stage => "STAGE",
            Feature::Event => "EVENT",
            Feature::Salmon => "SALMON",
            Feature::TeamContest => "TEAM_CONTEST",
            Feature::Fest => "FEST",
            Feature::Gear => "GEAR",
            Feature::CoopMonthly => "COOP_MONTHLY",
            Feature::XRank => "XRANK",
        }
    }

    pub fn channel_env_var(&self) -> String {
        format!("{}_NOTIFY_CHANNEL_ID", self.env_prefix())
    }

    /// `None` for features that never announce on startup.
    pub fn on_start_env_var(&self) -> Option<String> {
        match self {
            Feature::CoopMonthly | Feature::XRank => None,
            _ => Some(format!("{}_NOTIFY_ON_START", self.env_prefix())),
        }
    }

    /// Japanese label used in "notify here" confirmations.
    pub fn label(&self) -> &'static str {
        match self {
            Feature::Stage => "ステージ",
            Feature::Event => "イベントマッチ",
            Feature::Salmon => "サーモンラン",
            Feature::TeamContest => "バイトチームコンテスト",
            Feature::Fest => "フェス",
            Feature::Gear => "ギア更新",
            Feature::CoopMonthly => "サーモンラン月替わりギア",
            Feature::XRank => "Xランキング",
        }
    }

    /// Slash command that routes this feature to the invoking channel.
    pub fn notify_here_command(&self) -> &'static str {
        match self {
            Feature::Stage => "notify_here",
            Feature::Event => "event_notify_here",
            Feature::Salmon => "salmon_notify_here",
            Feature::TeamContest => "team_contest_notify_here",
            Feature::Fest => "fest_notify_here",
            Feature::Gear => "gear_notify_here",
            Feature::CoopMonthly => "monthly_gear_notify_here",
            Feature::XRank => "xrank_notify_here",
        }
    }

    pub fn from_notify_here_command(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.notify_here_command() == name)
    }

    /// Whether the job pauses while a splatfest is running.
    pub fn paused_during_fest(&self) -> bool {
        !matches!(self, Feature::Fest)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| format!("unknown feature: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_roundtrip_str() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>().unwrap(), feature);
        }
        assert!("unknown".parse::<Feature>().is_err());
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(
            Feature::TeamContest.channel_env_var(),
            "TEAM_CONTEST_NOTIFY_CHANNEL_ID"
        );
        assert_eq!(
            Feature::Stage.on_start_env_var().as_deref(),
            Some("STAGE_NOTIFY_ON_START")
        );
        assert!(Feature::XRank.on_start_env_var().is_none());
        assert!(Feature::CoopMonthly.on_start_env_var().is_none());
    }

    #[test]
    fn test_notify_here_lookup() {
        assert_eq!(
            Feature::from_notify_here_command("monthly_gear_notify_here"),
            Some(Feature::CoopMonthly)
        );
        assert_eq!(Feature::from_notify_here_command("notify_here"), Some(Feature::Stage));
        assert_eq!(Feature::from_notify_here_command("now"), None);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for feature in Feature::ALL {
            let json = serde_json::to_string(&feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
        }
    }
}
