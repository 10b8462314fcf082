//! Secrets configuration loaded from environment variables only.
//!
//! The Discord token must never end up in the settings file, so it is read
//! from the environment (or a local `.env`).

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Discord bot token (env: DISCORD_TOKEN, or DISCORD_BOT_TOKEN)
    pub discord_token: String,
}

/// Errors that can occur when loading secrets
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// Loads `.env` first if present. Values already in the environment win.
    pub fn from_env() -> Result<Self, SecretsError> {
        let _ = dotenvy::dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from environment without loading .env
    pub(crate) fn from_env_inner() -> Result<Self, SecretsError> {
        let discord_token = ["DISCORD_TOKEN", "DISCORD_BOT_TOKEN"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| SecretsError::MissingSecret("DISCORD_TOKEN".to_string()))?;

        Ok(Self { discord_token })
    }
}
