//! JSON documents persisted on local disk.
//!
//! Background jobs of different features run concurrently and all of them
//! read-modify-write the same notify state file, so every update goes
//! through one in-process mutex per store.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::feature::Feature;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-feature slot of the notify state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureState {
    /// Channel chosen with the feature's "notify here" command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<u64>,

    /// Last announced rotation key, content id or send date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,

    /// Id of the last posted message (stage notifications replace it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<u64>,
}

/// Flat mapping of feature name to its routing and last-seen markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyState {
    features: BTreeMap<Feature, FeatureState>,
}

impl NotifyState {
    pub fn get(&self, feature: Feature) -> Option<&FeatureState> {
        self.features.get(&feature)
    }

    pub fn entry(&mut self, feature: Feature) -> &mut FeatureState {
        self.features.entry(feature).or_default()
    }

    pub fn channel_id(&self, feature: Feature) -> Option<u64> {
        self.get(feature).and_then(|s| s.channel_id)
    }

    pub fn last_key(&self, feature: Feature) -> Option<&str> {
        self.get(feature).and_then(|s| s.last_key.as_deref())
    }

    pub fn last_message_id(&self, feature: Feature) -> Option<u64> {
        self.get(feature).and_then(|s| s.last_message_id)
    }

    /// Channel a feature posts to.
    ///
    /// The feature's stored channel wins over its env value. Features other
    /// than the stage feature then fall back to the stage channel.
    pub fn resolve_channel(&self, feature: Feature, env: &crate::NotifyEnv) -> Option<u64> {
        self.channel_id(feature)
            .or_else(|| env.channel(feature))
            .or_else(|| {
                if feature == Feature::Stage {
                    None
                } else {
                    self.channel_id(Feature::Stage)
                        .or_else(|| env.channel(Feature::Stage))
                }
            })
    }
}

/// A serde document at a fixed path with serialized read-modify-write.
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document. A missing or corrupt file reads as the default.
    pub async fn load(&self) -> T {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Apply `f` to the current document and persist the result.
    pub async fn update<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_unlocked().await;
        let out = f(&mut doc);
        self.write_unlocked(&doc).await?;
        Ok(out)
    }

    async fn read_unlocked(&self) -> T {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("state: ignoring unreadable {}: {err}", self.path.display());
                T::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(err) => {
                warn!("state: failed to read {}: {err}", self.path.display());
                T::default()
            }
        }
    }

    async fn write_unlocked(&self, doc: &T) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(doc)?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, content).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

pub type StateStore = JsonStore<NotifyState>;
