use chrono::{DateTime, Utc};
use tracing::{debug, info};

use ikabot_core::gear::{GearItem, GearNotifyState, coop_monthly_gear, coop_monthly_id, diff};
use ikabot_core::schedule::{current_fest, find_current, results, stage_rotation_key, start_time_raw};
use ikabot_core::xrank::{daily_post_due, season_end};
use ikabot_core::{Feature, RotationDecision, RotationTracker};

use super::{Job, Notifier, NotifyError, TickOutcome};
use crate::api::Endpoint;
use crate::payload::{self, Payload, event::EventStatus};

impl Notifier {
    async fn channel(&self, feature: Feature) -> Option<u64> {
        self.state
            .store
            .load()
            .await
            .resolve_channel(feature, &self.state.notify_env)
    }

    async fn fest_running(&self, now: DateTime<Utc>) -> bool {
        self.state.source.is_fest_active(now).await
    }

    fn tracker(&self, feature: Feature) -> RotationTracker<'_> {
        RotationTracker::new(
            &self.state.store,
            feature,
            self.state.notify_env.announces_on_start(feature),
        )
    }

    /// Send `payload` when `key` is a new rotation and record it afterwards.
    async fn announce_rotation(
        &self,
        feature: Feature,
        channel: u64,
        key: &str,
        payload: impl std::future::Future<Output = Payload>,
    ) -> Result<TickOutcome, NotifyError> {
        let tracker = self.tracker(feature);
        match tracker.observe(key).await? {
            RotationDecision::PersistSilently => Ok(TickOutcome::Persisted),
            RotationDecision::Unchanged => Ok(TickOutcome::Unchanged),
            RotationDecision::Announce => {
                let payload = payload.await;
                let message_id = self.sink.send(channel, &payload).await?;
                tracker.commit(key, Some(message_id)).await?;
                info!("{} rotation announced (key={key})", feature.as_str());
                Ok(TickOutcome::Sent)
            }
        }
    }

    /// Current battle stages. The previous announcement is replaced.
    pub(super) async fn stage_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        let Some(channel) = self.channel(Feature::Stage).await else {
            return Ok(TickOutcome::NoChannel);
        };
        if self.fest_running(now).await {
            return Ok(TickOutcome::FestPaused);
        }
        let Some(doc) = self.state.source.fetch_json(Endpoint::Schedule).await else {
            return Ok(TickOutcome::NoData);
        };
        let Some(key) = stage_rotation_key(&doc) else {
            return Ok(TickOutcome::NoData);
        };

        let tracker = self.tracker(Feature::Stage);
        match tracker.observe(&key).await? {
            RotationDecision::PersistSilently => return Ok(TickOutcome::Persisted),
            RotationDecision::Unchanged => return Ok(TickOutcome::Unchanged),
            RotationDecision::Announce => {}
        }

        let cx = self.state.payload_context();
        let payload = payload::stages::build(&cx, &doc, 0).await;

        let previous = self.state.store.load().await.last_message_id(Feature::Stage);
        if let Some(message_id) = previous
            && let Err(e) = self.sink.delete(channel, message_id).await
        {
            debug!("previous stage message {message_id} not deleted: {e}");
        }

        let message_id = self.sink.send(channel, &payload).await?;
        tracker.commit(&key, Some(message_id)).await?;
        info!("stage rotation announced (key={key})");
        Ok(TickOutcome::Sent)
    }

    /// Event matches, salmon run and team contest: keyed on the running item.
    pub(super) async fn shift_tick(&self, job: Job, now: DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        let feature = job.feature();
        let Some(channel) = self.channel(feature).await else {
            return Ok(TickOutcome::NoChannel);
        };
        if self.fest_running(now).await {
            return Ok(TickOutcome::FestPaused);
        }
        let endpoint = match job {
            Job::Event => Endpoint::Event,
            Job::TeamContest => Endpoint::TeamContest,
            _ => Endpoint::Salmon,
        };
        let Some(doc) = self.state.source.fetch_json(endpoint).await else {
            return Ok(TickOutcome::NoData);
        };
        let items = results(&doc);
        let Some(current) = find_current(items, now) else {
            return Ok(TickOutcome::NoData);
        };
        let Some(key) = start_time_raw(current) else {
            return Ok(TickOutcome::NoData);
        };

        let cx = self.state.payload_context();
        let announcement = async {
            match job {
                Job::Event => payload::event::build(&cx, current, Some(EventStatus::Ongoing)).await,
                Job::TeamContest => payload::salmon::build_team_contest(&cx, &items[0]).await,
                _ => payload::salmon::build_salmon(&cx, &items[0]).await,
            }
        };
        self.announce_rotation(feature, channel, key, announcement).await
    }

    /// Splatfest announcements. Never paused.
    pub(super) async fn fest_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        let Some(channel) = self.channel(Feature::Fest).await else {
            return Ok(TickOutcome::NoChannel);
        };
        let Some(doc) = self.state.source.fetch_json(Endpoint::Festivals).await else {
            return Ok(TickOutcome::NoData);
        };
        let Some(record) = current_fest(&doc, now) else {
            return Ok(TickOutcome::NoData);
        };
        let Some(key) = start_time_raw(record) else {
            return Ok(TickOutcome::NoData);
        };

        let cx = self.state.payload_context();
        let payload = payload::fest::build(&cx, record);
        self.announce_rotation(Feature::Fest, channel, key, payload).await
    }

    /// Gesotown offers, then the salmon run monthly gear.
    pub(super) async fn gear_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        if self.fest_running(now).await {
            return Ok(TickOutcome::FestPaused);
        }
        let offers = self.gesotown_tick().await?;
        let monthly = self.coop_monthly_tick().await?;
        Ok(if monthly == TickOutcome::Sent { monthly } else { offers })
    }

    async fn gesotown_tick(&self) -> Result<TickOutcome, NotifyError> {
        let Some(channel) = self.channel(Feature::Gear).await else {
            return Ok(TickOutcome::NoChannel);
        };
        let cx = self.state.payload_context();
        let (gesotown, locale) = match payload::gear::fetch_gesotown(&cx).await {
            Ok(fetched) => fetched,
            Err(e) => {
                debug!("gesotown unavailable: {e}");
                return Ok(TickOutcome::NoData);
            }
        };

        let gear_store = &self.state.gear_store;
        let previous = gear_store.load().await;
        if previous.is_first_observation() && !self.state.notify_env.announces_on_start(Feature::Gear) {
            gear_store
                .update(|state: &mut GearNotifyState| gesotown.snapshot_into(state))
                .await?;
            return Ok(TickOutcome::Persisted);
        }

        let mut outcome = TickOutcome::Unchanged;

        let limited_sig = gesotown.limited_signature();
        if previous.limited_sig.as_deref() != Some(limited_sig.as_str()) {
            let changes = diff(&previous.limited_items, &gesotown.limited_items);
            let payload = payload::gear::rotation(&cx, &gesotown, &changes).await;
            self.sink.send(channel, &payload).await?;
            let items = gesotown.limited_items.iter().map(GearItem::snapshot).collect();
            gear_store
                .update(|state: &mut GearNotifyState| {
                    state.limited_sig = Some(limited_sig);
                    state.limited_items = items;
                })
                .await?;
            info!(
                "gear rotation announced (new={}, removed={})",
                changes.added.len(),
                changes.removed.len()
            );
            outcome = TickOutcome::Sent;
        }

        let pickup_sig = gesotown.pickup_signature();
        if previous.pickup_sig.as_deref() != Some(pickup_sig.as_str()) {
            let payload = payload::gear::pickup(&cx, &gesotown, &locale).await;
            self.sink.send(channel, &payload).await?;
            let items = gesotown.pickup_items.iter().map(GearItem::snapshot).collect();
            gear_store
                .update(|state: &mut GearNotifyState| {
                    state.pickup_sig = Some(pickup_sig);
                    state.pickup_items = items;
                })
                .await?;
            info!("gear pickup announced");
            outcome = TickOutcome::Sent;
        }

        Ok(outcome)
    }

    /// Monthly reward gear. Without a channel the new id is still recorded.
    async fn coop_monthly_tick(&self) -> Result<TickOutcome, NotifyError> {
        let Some(doc) = self.state.source.fetch_json(Endpoint::Coop).await else {
            return Ok(TickOutcome::NoData);
        };
        let Some(monthly) = coop_monthly_gear(&doc) else {
            return Ok(TickOutcome::NoData);
        };
        let Some(id) = coop_monthly_id(monthly) else {
            return Ok(TickOutcome::NoData);
        };

        let tracker = self.tracker(Feature::CoopMonthly);
        match tracker.observe(&id).await? {
            RotationDecision::PersistSilently => Ok(TickOutcome::Persisted),
            RotationDecision::Unchanged => Ok(TickOutcome::Unchanged),
            RotationDecision::Announce => match self.channel(Feature::CoopMonthly).await {
                Some(channel) => {
                    let locale = self.state.source.locale().await;
                    let payload = payload::gear::monthly(monthly, &locale);
                    let message_id = self.sink.send(channel, &payload).await?;
                    tracker.commit(&id, Some(message_id)).await?;
                    info!("coop monthly gear announced (id={id})");
                    Ok(TickOutcome::Sent)
                }
                None => {
                    tracker.commit(&id, None).await?;
                    Ok(TickOutcome::NoChannel)
                }
            },
        }
    }

    /// X ranking: once, right after midnight of the season's final day.
    pub(super) async fn xrank_tick(&self, now: DateTime<Utc>) -> Result<TickOutcome, NotifyError> {
        let Some(channel) = self.channel(Feature::XRank).await else {
            return Ok(TickOutcome::NoChannel);
        };
        if self.fest_running(now).await {
            return Ok(TickOutcome::FestPaused);
        }
        let Some(doc) = self.state.source.fetch_json(Endpoint::XRank).await else {
            return Ok(TickOutcome::NoData);
        };
        let zone = self.state.zone;
        let Some(end) = season_end(&doc, zone) else {
            return Ok(TickOutcome::NoData);
        };

        let last_sent = self.state.store.load().await.last_key(Feature::XRank).map(str::to_string);
        let local_now = zone.localize(&now.fixed_offset());
        let Some(date) = daily_post_due(local_now, end, last_sent.as_deref()) else {
            return Ok(TickOutcome::Unchanged);
        };

        let payload = payload::xrank::build(&doc, self.state.settings.notify.xrank_top_n, zone);
        let message_id = self.sink.send(channel, &payload).await?;
        self.tracker(Feature::XRank).commit(&date, Some(message_id)).await?;
        info!("xrank leaderboard posted for {date}");
        Ok(TickOutcome::Sent)
    }
}
