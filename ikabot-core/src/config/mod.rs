//! Configuration management for ikabot.
//!
//! Secrets (the Discord token) and notification routing come from the
//! environment. Everything else is read from a TOML settings file.
//!
//! # Configuration Sources
//!
//! ## Environment
//! - `DISCORD_TOKEN` - Discord bot token
//! - `<FEATURE>_NOTIFY_CHANNEL_ID` - fallback notification channel per feature
//! - `<FEATURE>_NOTIFY_ON_START` - `1` to announce the current rotation on startup
//! - `BOT_ACTIVITY_NAME` - presence text (default `Splatoon`)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/ikabot/config.toml`:
//! ```toml
//! [api]
//! timeout_seconds = 10
//!
//! [notify]
//! poll_seconds = 60
//! gear_poll_seconds = 600
//!
//! [logging]
//! level = "info"
//! ```

mod notify_env;
mod secrets;
mod settings;

pub use notify_env::NotifyEnv;
pub use secrets::{Secrets, SecretsError};
pub use settings::{
    ApiSettings, DisplaySettings, LoggingSettings, NotifySettings, PathSettings, Settings,
    SettingsError,
};

/// Combined configuration containing secrets, settings and routing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
    /// Notification routing loaded from environment variables
    pub notify: NotifyEnv,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// `.env` is loaded first so that both secrets and routing see it.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();

        let secrets = Secrets::from_env_inner()?;
        let settings = Settings::load()?;
        let notify = NotifyEnv::from_env();

        Ok(Self {
            secrets,
            settings,
            notify,
        })
    }

    pub fn discord_token(&self) -> &str {
        &self.secrets.discord_token
    }
}

/// Load .env file if it exists (for development convenience).
///
/// Variables already present in the environment are not overridden.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());
}
