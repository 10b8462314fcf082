//! Settings configuration loaded from TOML files.
//!
//! Non-sensitive configuration lives in `~/.config/ikabot/config.toml`
//! (or `$IKABOT_CONFIG_DIR/config.toml`). A commented default file is
//! written on first start.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# ikabot configuration file
# Located at: ~/.config/ikabot/config.toml
#
# This file contains non-sensitive configuration.
# The bot token and notification routing come from environment variables:
#   - DISCORD_TOKEN
#   - <FEATURE>_NOTIFY_CHANNEL_ID / <FEATURE>_NOTIFY_ON_START
#   - BOT_ACTIVITY_NAME

[api]
user_agent = "DiscordBot_SplaStageInfo (Contact: chihalu)"
timeout_seconds = 10
locale_cache_minutes = 360
schedule_url = "https://spla3.yuu26.com/api/schedule"
salmon_url = "https://spla3.yuu26.com/api/coop-grouping/schedule"
team_contest_url = "https://spla3.yuu26.com/api/coop-grouping-team-contest/schedule"
event_url = "https://spla3.yuu26.com/api/event/schedule"
gear_url = "https://splatoon3.ink/data/gear.json"
coop_url = "https://splatoon3.ink/data/coop.json"
festivals_url = "https://splatoon3.ink/data/festivals.json"
xrank_url = "https://splatoon3.ink/data/xrank/xrank.takoroka.json"
locale_url = "https://splatoon3.ink/data/locale/ja-JP.json"

[paths]
# Relative paths are resolved against base_dir (default: working directory)
# base_dir = "/srv/ikabot"
image_dir = "img"
weapon_dir = "img/武器"
nameplate_dir = "img/ネームプレート"
brand_dir = "img/ギアブランド"
latin_font = "BlitzBold.otf"
kanji_font = "FOT-KurokaneStd-EB.otf"
state_file = ".bot_state.json"
gear_state_file = ".gear_notify_state.json"
lock_dir = ".locks"

[notify]
poll_seconds = 60
gear_poll_seconds = 600
lock_ttl_seconds = 120
xrank_top_n = 100

[display]
# Fixed UTC offset for rendered times; system local time when unset
# utc_offset_hours = 9

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Upstream endpoints and HTTP behavior
    #[serde(default)]
    pub api: ApiSettings,

    /// Asset, font and state file locations
    #[serde(default)]
    pub paths: PathSettings,

    /// Polling periods and lock TTL
    #[serde(default)]
    pub notify: NotifySettings,

    /// Time zone used for rendered times
    #[serde(default)]
    pub display: DisplaySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How long a fetched locale table stays valid
    #[serde(default = "default_locale_cache_minutes")]
    pub locale_cache_minutes: u64,

    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,
    #[serde(default = "default_salmon_url")]
    pub salmon_url: String,
    #[serde(default = "default_team_contest_url")]
    pub team_contest_url: String,
    #[serde(default = "default_event_url")]
    pub event_url: String,
    #[serde(default = "default_gear_url")]
    pub gear_url: String,
    #[serde(default = "default_coop_url")]
    pub coop_url: String,
    #[serde(default = "default_festivals_url")]
    pub festivals_url: String,
    #[serde(default = "default_xrank_url")]
    pub xrank_url: String,
    #[serde(default = "default_locale_url")]
    pub locale_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    /// Base directory for relative paths (working directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_weapon_dir")]
    pub weapon_dir: PathBuf,
    #[serde(default = "default_nameplate_dir")]
    pub nameplate_dir: PathBuf,
    #[serde(default = "default_brand_dir")]
    pub brand_dir: PathBuf,

    /// Font used for everything but kanji
    #[serde(default = "default_latin_font")]
    pub latin_font: PathBuf,
    /// Font used for kanji code points
    #[serde(default = "default_kanji_font")]
    pub kanji_font: PathBuf,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_gear_state_file")]
    pub gear_state_file: PathBuf,
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifySettings {
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
    #[serde(default = "default_gear_poll_seconds")]
    pub gear_poll_seconds: u64,
    /// Lock files older than this are considered abandoned
    #[serde(default = "default_lock_ttl_seconds")]
    pub lock_ttl_seconds: u64,
    #[serde(default = "default_xrank_top_n")]
    pub xrank_top_n: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_hours: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_user_agent() -> String {
    "DiscordBot_SplaStageInfo (Contact: chihalu)".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_locale_cache_minutes() -> u64 {
    360
}

fn default_schedule_url() -> String {
    "https://spla3.yuu26.com/api/schedule".to_string()
}

fn default_salmon_url() -> String {
    "https://spla3.yuu26.com/api/coop-grouping/schedule".to_string()
}

fn default_team_contest_url() -> String {
    "https://spla3.yuu26.com/api/coop-grouping-team-contest/schedule".to_string()
}

fn default_event_url() -> String {
    "https://spla3.yuu26.com/api/event/schedule".to_string()
}

fn default_gear_url() -> String {
    "https://splatoon3.ink/data/gear.json".to_string()
}

fn default_coop_url() -> String {
    "https://splatoon3.ink/data/coop.json".to_string()
}

fn default_festivals_url() -> String {
    "https://splatoon3.ink/data/festivals.json".to_string()
}

fn default_xrank_url() -> String {
    "https://splatoon3.ink/data/xrank/xrank.takoroka.json".to_string()
}

fn default_locale_url() -> String {
    "https://splatoon3.ink/data/locale/ja-JP.json".to_string()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("img")
}

fn default_weapon_dir() -> PathBuf {
    PathBuf::from("img/武器")
}

fn default_nameplate_dir() -> PathBuf {
    PathBuf::from("img/ネームプレート")
}

fn default_brand_dir() -> PathBuf {
    PathBuf::from("img/ギアブランド")
}

fn default_latin_font() -> PathBuf {
    PathBuf::from("BlitzBold.otf")
}

fn default_kanji_font() -> PathBuf {
    PathBuf::from("FOT-KurokaneStd-EB.otf")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".bot_state.json")
}

fn default_gear_state_file() -> PathBuf {
    PathBuf::from(".gear_notify_state.json")
}

fn default_lock_dir() -> PathBuf {
    PathBuf::from(".locks")
}

fn default_poll_seconds() -> u64 {
    60
}

fn default_gear_poll_seconds() -> u64 {
    600
}

fn default_lock_ttl_seconds() -> u64 {
    120
}

fn default_xrank_top_n() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
            locale_cache_minutes: default_locale_cache_minutes(),
            schedule_url: default_schedule_url(),
            salmon_url: default_salmon_url(),
            team_contest_url: default_team_contest_url(),
            event_url: default_event_url(),
            gear_url: default_gear_url(),
            coop_url: default_coop_url(),
            festivals_url: default_festivals_url(),
            xrank_url: default_xrank_url(),
            locale_url: default_locale_url(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: None,
            image_dir: default_image_dir(),
            weapon_dir: default_weapon_dir(),
            nameplate_dir: default_nameplate_dir(),
            brand_dir: default_brand_dir(),
            latin_font: default_latin_font(),
            kanji_font: default_kanji_font(),
            state_file: default_state_file(),
            gear_state_file: default_gear_state_file(),
            lock_dir: default_lock_dir(),
        }
    }
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
            gear_poll_seconds: default_gear_poll_seconds(),
            lock_ttl_seconds: default_lock_ttl_seconds(),
            xrank_top_n: default_xrank_top_n(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn locale_ttl(&self) -> Duration {
        Duration::from_secs(self.locale_cache_minutes * 60)
    }
}

impl PathSettings {
    /// Resolve a configured path against `base_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl NotifySettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds.max(1))
    }

    pub fn gear_poll_interval(&self) -> Duration {
        Duration::from_secs(self.gear_poll_seconds.max(1))
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// `$IKABOT_CONFIG_DIR/config.toml` when set, else the XDG config dir.
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("IKABOT_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("ikabot");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::ENV_MUTEX;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.api.timeout_seconds, 10);
        assert_eq!(
            settings.api.user_agent,
            "DiscordBot_SplaStageInfo (Contact: chihalu)"
        );
        assert_eq!(settings.api.schedule_url, "https://spla3.yuu26.com/api/schedule");
        assert_eq!(settings.notify.poll_seconds, 60);
        assert_eq!(settings.notify.gear_poll_seconds, 600);
        assert_eq!(settings.notify.lock_ttl(), Duration::from_secs(120));
        assert_eq!(settings.paths.state_file, PathBuf::from(".bot_state.json"));
        assert!(settings.display.utc_offset_hours.is_none());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        let defaults = Settings::default();

        assert_eq!(parsed.api.user_agent, defaults.api.user_agent);
        assert_eq!(parsed.api.locale_url, defaults.api.locale_url);
        assert_eq!(parsed.paths.weapon_dir, defaults.paths.weapon_dir);
        assert_eq!(parsed.paths.lock_dir, defaults.paths.lock_dir);
        assert_eq!(parsed.notify.xrank_top_n, defaults.notify.xrank_top_n);
        assert_eq!(parsed.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[notify]
poll_seconds = 30

[display]
utc_offset_hours = 9
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert_eq!(settings.notify.poll_seconds, 30);
        assert_eq!(settings.notify.gear_poll_seconds, 600);
        assert_eq!(settings.display.utc_offset_hours, Some(9));
        assert_eq!(settings.api.timeout_seconds, 10);
    }

    #[test]
    fn test_resolve_against_base_dir() {
        let mut paths = PathSettings::default();
        assert_eq!(paths.resolve(Path::new("img")), PathBuf::from("img"));

        paths.base_dir = Some(PathBuf::from("/srv/ikabot"));
        assert_eq!(
            paths.resolve(Path::new("img")),
            PathBuf::from("/srv/ikabot/img")
        );
        assert_eq!(
            paths.resolve(Path::new("/abs/font.otf")),
            PathBuf::from("/abs/font.otf")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.notify.lock_ttl_seconds = 5;
        settings.display.utc_offset_hours = Some(-3);
        settings.save_to_path(&path).expect("save failed");

        let content = fs::read_to_string(&path).expect("read failed");
        let loaded = Settings::from_toml(&content).expect("parse failed");

        assert_eq!(loaded.notify.lock_ttl_seconds, 5);
        assert_eq!(loaded.display.utc_offset_hours, Some(-3));
    }

    #[test]
    fn test_load_creates_default_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();

        // SAFETY: test-scoped env mutation.
        unsafe { std::env::set_var("IKABOT_CONFIG_DIR", dir.path()) };
        let settings = Settings::load();
        let path = Settings::config_path();
        // SAFETY: test-scoped env mutation cleanup.
        unsafe { std::env::remove_var("IKABOT_CONFIG_DIR") };

        let settings = settings.unwrap();
        assert_eq!(path.unwrap(), dir.path().join("config.toml"));
        assert!(dir.path().join("config.toml").exists());
        assert_eq!(settings.notify.poll_seconds, 60);
    }
}
