use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ikabot_core::config::Settings;
use ikabot_core::{DisplayZone, GearNotifyState, JsonStore, NotifyEnv, StateStore};

use crate::api::ScheduleSource;
use crate::assets::Assets;
use crate::payload::PayloadContext;
use crate::render::Renderer;

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    /// Notification channels and startup flags read from the environment
    pub notify_env: NotifyEnv,
    /// Upstream documents (HTTP in production, fixtures in tests)
    pub source: Arc<dyn ScheduleSource>,
    pub assets: Assets,
    pub renderer: Renderer,
    /// Per-feature channel routing and last-seen markers
    pub store: StateStore,
    /// Last seen gesotown offers
    pub gear_store: JsonStore<GearNotifyState>,
    pub zone: DisplayZone,
    commands_registered: AtomicBool,
    runners_started: AtomicBool,
}

impl AppState {
    pub fn new(
        settings: Settings,
        notify_env: NotifyEnv,
        source: Arc<dyn ScheduleSource>,
        assets: Assets,
        renderer: Renderer,
    ) -> Self {
        let paths = &settings.paths;
        let store = JsonStore::new(paths.resolve(&paths.state_file));
        let gear_store = JsonStore::new(paths.resolve(&paths.gear_state_file));
        let zone = DisplayZone::from_offset_hours(settings.display.utc_offset_hours);
        Self {
            settings,
            notify_env,
            source,
            assets,
            renderer,
            store,
            gear_store,
            zone,
            commands_registered: AtomicBool::new(false),
            runners_started: AtomicBool::new(false),
        }
    }

    /// Everything payload builders need, borrowed from the state.
    pub fn payload_context(&self) -> PayloadContext<'_> {
        PayloadContext {
            source: self.source.as_ref(),
            assets: &self.assets,
            renderer: &self.renderer,
            zone: self.zone,
            xrank_top_n: self.settings.notify.xrank_top_n,
        }
    }

    /// True exactly once: the caller registers the slash commands.
    pub fn claim_command_registration(&self) -> bool {
        !self.commands_registered.swap(true, Ordering::SeqCst)
    }

    /// True exactly once: the caller starts the notification runners.
    pub fn claim_runner_start(&self) -> bool {
        !self.runners_started.swap(true, Ordering::SeqCst)
    }

    /// Re-arm command registration after a failed attempt.
    pub fn release_command_registration(&self) {
        self.commands_registered.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoint;
    use ikabot_core::gear::Locale;
    use serde_json::Value;

    struct NoSource;

    #[async_trait::async_trait]
    impl ScheduleSource for NoSource {
        async fn fetch_json(&self, _endpoint: Endpoint) -> Option<Value> {
            None
        }

        async fn fetch_image(&self, _url: &str) -> Option<Vec<u8>> {
            None
        }

        async fn locale(&self) -> Arc<Locale> {
            Arc::new(Locale::default())
        }
    }

    #[test]
    fn test_startup_claims_are_single_shot() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.base_dir = Some(dir.path().to_path_buf());
        let assets = Assets::from_settings(&settings.paths);
        let renderer = Renderer::new(crate::render::FontSet::system());
        let state = AppState::new(
            settings,
            NotifyEnv::default(),
            Arc::new(NoSource),
            assets,
            renderer,
        );

        assert!(state.claim_runner_start());
        assert!(!state.claim_runner_start());

        assert!(state.claim_command_registration());
        state.release_command_registration();
        assert!(state.claim_command_registration());
        assert!(!state.claim_command_registration());
        assert!(state.store.path().starts_with(dir.path()));
    }
}
