pub mod config;
pub mod feature;
pub mod gear;
pub mod lock;
pub mod rotation;
pub mod schedule;
pub mod store;
pub mod xrank;

// Config re-exports
pub use config::{
    Config, ConfigError, NotifyEnv, Secrets, SecretsError, Settings, SettingsError, load_dotenv,
};

pub use feature::Feature;
pub use gear::{GearDiff, GearItem, GearNotifyState, GearSnapshot, Gesotown, Locale};
pub use lock::{LockError, LockGuard, acquire_lock};
pub use rotation::{RotationDecision, RotationTracker, evaluate_rotation};
pub use schedule::{DisplayZone, UNKNOWN};
pub use store::{FeatureState, JsonStore, NotifyState, StateStore, StoreError};
