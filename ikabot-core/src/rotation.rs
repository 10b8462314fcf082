//! Rotation detection against the persisted notify state.
//!
//! A feature's rotation key (usually the start time of the running slot) is
//! compared to the last key the bot announced. The first key ever seen is
//! stored without an announcement unless the feature is configured to
//! announce on startup, so restarts never repeat a notification.

use crate::feature::Feature;
use crate::store::{StateStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDecision {
    /// First observation: remember the key, send nothing.
    PersistSilently,
    /// New rotation: send, then commit the key.
    Announce,
    /// Key already announced.
    Unchanged,
}

pub fn evaluate_rotation(
    last: Option<&str>,
    current: &str,
    announce_on_start: bool,
) -> RotationDecision {
    match last {
        None if announce_on_start => RotationDecision::Announce,
        None => RotationDecision::PersistSilently,
        Some(last) if last == current => RotationDecision::Unchanged,
        Some(_) => RotationDecision::Announce,
    }
}

/// Rotation bookkeeping for one feature.
pub struct RotationTracker<'a> {
    store: &'a StateStore,
    feature: Feature,
    announce_on_start: bool,
}

impl<'a> RotationTracker<'a> {
    pub fn new(store: &'a StateStore, feature: Feature, announce_on_start: bool) -> Self {
        Self {
            store,
            feature,
            announce_on_start,
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Compare `key` with the stored one. A silent first observation is
    /// persisted here; announcements are persisted by [`Self::commit`].
    pub async fn observe(&self, key: &str) -> Result<RotationDecision, StoreError> {
        let state = self.store.load().await;
        let decision = evaluate_rotation(state.last_key(self.feature), key, self.announce_on_start);
        if decision == RotationDecision::PersistSilently {
            self.commit(key, None).await?;
        }
        Ok(decision)
    }

    /// Record `key` as announced, with the id of the message that announced it.
    pub async fn commit(&self, key: &str, message_id: Option<u64>) -> Result<(), StoreError> {
        let feature = self.feature;
        self.store
            .update(|state| {
                let slot = state.entry(feature);
                slot.last_key = Some(key.to_string());
                if message_id.is_some() {
                    slot.last_message_id = message_id;
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;

    #[test]
    fn test_evaluate_first_observation() {
        assert_eq!(
            evaluate_rotation(None, "k1", false),
            RotationDecision::PersistSilently
        );
        assert_eq!(evaluate_rotation(None, "k1", true), RotationDecision::Announce);
    }

    #[test]
    fn test_evaluate_known_key() {
        assert_eq!(
            evaluate_rotation(Some("k1"), "k1", false),
            RotationDecision::Unchanged
        );
        assert_eq!(
            evaluate_rotation(Some("k1"), "k1", true),
            RotationDecision::Unchanged
        );
        assert_eq!(
            evaluate_rotation(Some("k1"), "k2", false),
            RotationDecision::Announce
        );
    }

    #[tokio::test]
    async fn test_tracker_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store: StateStore = JsonStore::new(dir.path().join("state.json"));
        let tracker = RotationTracker::new(&store, Feature::Salmon, false);

        assert_eq!(
            tracker.observe("k1").await.unwrap(),
            RotationDecision::PersistSilently
        );
        assert_eq!(tracker.observe("k1").await.unwrap(), RotationDecision::Unchanged);
        assert_eq!(tracker.observe("k2").await.unwrap(), RotationDecision::Announce);
        // Not committed yet: a failed send is retried on the next poll.
        assert_eq!(tracker.observe("k2").await.unwrap(), RotationDecision::Announce);

        tracker.commit("k2", Some(77)).await.unwrap();
        assert_eq!(tracker.observe("k2").await.unwrap(), RotationDecision::Unchanged);

        let state = store.load().await;
        assert_eq!(state.last_key(Feature::Salmon), Some("k2"));
        assert_eq!(state.last_message_id(Feature::Salmon), Some(77));
    }

    #[tokio::test]
    async fn test_commit_keeps_previous_message_id() {
        let dir = tempfile::tempdir().unwrap();
        let store: StateStore = JsonStore::new(dir.path().join("state.json"));
        let tracker = RotationTracker::new(&store, Feature::Stage, true);

        tracker.commit("k1", Some(5)).await.unwrap();
        tracker.commit("k2", None).await.unwrap();

        let state = store.load().await;
        assert_eq!(state.last_key(Feature::Stage), Some("k2"));
        assert_eq!(state.last_message_id(Feature::Stage), Some(5));
    }
}
