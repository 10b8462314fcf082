//! Background notification jobs.
//!
//! Each job polls one upstream document on a fixed interval, compares its
//! rotation key with the persisted one and posts an announcement to the
//! feature's channel when the key moves. Runs are serialized per job with a
//! lock file so two bot processes sharing a state directory never post twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use ikabot_core::config::NotifySettings;
use ikabot_core::{Feature, LockError, StoreError, acquire_lock};

use crate::payload::Payload;
use crate::state::AppState;

mod jobs;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Discord request failed: {0}")]
    Discord(String),
}

/// Where announcements go. Discord in production, memory in tests.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    /// Post `payload` to `channel_id` and return the new message id.
    async fn send(&self, channel_id: u64, payload: &Payload) -> Result<u64, SinkError>;

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("send failed: {0}")]
    Sink(#[from] SinkError),
}

/// One background notification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Stage,
    Event,
    Salmon,
    TeamContest,
    Fest,
    /// Gesotown offers, followed by the salmon run monthly gear
    Gear,
    XRank,
}

impl Job {
    pub const ALL: [Job; 7] = [
        Job::Stage,
        Job::Event,
        Job::Salmon,
        Job::TeamContest,
        Job::Fest,
        Job::Gear,
        Job::XRank,
    ];

    /// Lock file and log name.
    pub fn name(self) -> &'static str {
        match self {
            Job::Stage => "stage",
            Job::Event => "event",
            Job::Salmon => "salmon",
            Job::TeamContest => "team_contest",
            Job::Fest => "fest",
            Job::Gear => "gear",
            Job::XRank => "xrank",
        }
    }

    pub fn feature(self) -> Feature {
        match self {
            Job::Stage => Feature::Stage,
            Job::Event => Feature::Event,
            Job::Salmon => Feature::Salmon,
            Job::TeamContest => Feature::TeamContest,
            Job::Fest => Feature::Fest,
            Job::Gear => Feature::Gear,
            Job::XRank => Feature::XRank,
        }
    }

    pub fn period(self, settings: &NotifySettings) -> Duration {
        match self {
            Job::Gear => settings.gear_poll_interval(),
            _ => settings.poll_interval(),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another run holds the job's lock
    Locked,
    NoChannel,
    /// Skipped while a splatfest is running
    FestPaused,
    /// Upstream document missing or without a current item
    NoData,
    /// First observation stored without posting
    Persisted,
    Unchanged,
    Sent,
}

/// Runs notification ticks against the shared state.
pub struct Notifier {
    state: Arc<AppState>,
    sink: Arc<dyn MessageSink>,
}

impl Notifier {
    pub fn new(state: Arc<AppState>, sink: Arc<dyn MessageSink>) -> Self {
        Self { state, sink }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// One poll of `job` as of `now`, under the job's lock.
    pub async fn tick(&self, job: Job, now: chrono::DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        let paths = &self.state.settings.paths;
        let lock_dir = paths.resolve(&paths.lock_dir);
        let Some(_guard) = acquire_lock(&lock_dir, job.name(), self.state.settings.notify.lock_ttl())? else {
            return Ok(TickOutcome::Locked);
        };

        match job {
            Job::Stage => self.stage_tick(now).await,
            Job::Event | Job::Salmon | Job::TeamContest => self.shift_tick(job, now).await,
            Job::Fest => self.fest_tick(now).await,
            Job::Gear => self.gear_tick(now).await,
            Job::XRank => self.xrank_tick(now).await,
        }
    }
}

async fn run_notify_tick(notifier: Arc<Notifier>, job: Job) {
    match notifier.tick(job, Utc::now()).await {
        Ok(TickOutcome::Sent) => info!("{} notification sent", job.name()),
        Ok(outcome) => debug!("{} tick: {outcome:?}", job.name()),
        Err(e) => warn!("{} tick failed: {e}", job.name()),
    }
}

/// Start one interval runner per job. The first tick fires immediately.
pub fn start_notify_runners(notifier: Arc<Notifier>) -> Vec<tokio::task::JoinHandle<()>> {
    let settings = notifier.state.settings.notify.clone();
    Job::ALL
        .into_iter()
        .map(|job| {
            let period = job.period(&settings);
            let mut interval = interval_at(Instant::now(), period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let notifier = Arc::clone(&notifier);
            let handle = tokio::spawn(async move {
                loop {
                    interval.tick().await;
                    run_notify_tick(Arc::clone(&notifier), job).await;
                }
            });

            info!(
                "{} runner started (period_seconds={})",
                job.name(),
                period.as_secs()
            );
            handle
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gear_uses_its_own_period() {
        let settings = NotifySettings {
            poll_seconds: 60,
            gear_poll_seconds: 300,
            ..NotifySettings::default()
        };
        assert_eq!(Job::Stage.period(&settings), Duration::from_secs(60));
        assert_eq!(Job::Gear.period(&settings), Duration::from_secs(300));
    }

    #[test]
    fn test_only_fest_runs_during_fest() {
        let paused: Vec<Job> = Job::ALL
            .into_iter()
            .filter(|job| !job.feature().paused_during_fest())
            .collect();
        assert_eq!(paused, vec![Job::Fest]);
    }

    #[test]
    fn test_job_names_are_unique() {
        let mut names: Vec<&str> = Job::ALL.iter().map(|job| job.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Job::ALL.len());
    }
}
