use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ikabot_gateway::api::ApiClient;
use ikabot_gateway::assets::Assets;
use ikabot_gateway::discord::start_discord_bot;
use ikabot_gateway::render::Renderer;
use ikabot_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (.env, config.toml, notification routing)
    let config = ikabot_core::Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.settings.logging.level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Configuration loaded ({} notification channels from env)",
        config.notify.channels.len()
    );

    let ikabot_core::Config {
        secrets,
        settings,
        notify,
    } = config;

    let source = Arc::new(ApiClient::new(settings.api.clone())?);
    let assets = Assets::from_settings(&settings.paths);
    info!(
        "Assets indexed ({} nameplates)",
        assets.nameplates().len()
    );
    let renderer = Renderer::from_settings(&settings.paths);

    // Create shared application state
    let state = Arc::new(AppState::new(settings, notify, source, assets, renderer));
    info!("State file: {}", state.store.path().display());

    let Some(mut client) = start_discord_bot(Some(secrets.discord_token), Arc::clone(&state)).await?
    else {
        return Err("DISCORD_TOKEN is empty".into());
    };

    // Spawn Discord client in background
    let discord_task = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            tracing::error!("Discord client error: {}", e);
        }
    });
    info!("Discord bot started");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    discord_task.abort();

    Ok(())
}
