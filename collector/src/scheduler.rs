use crate::{
    event::{
        EventBuilder,
        MetricEvent,
    },
    fetcher::StatsFetcher,
    parser::{
        self,
        ExtractedMetrics,
        ParseError,
    },
    publishers::Publisher,
    stats::CollectionStats,
};
use cassandrabeat_config::{
    CollectionConfig,
    CollectionTarget,
    DegradePolicy,
};
use std::sync::Arc;
use strum::Display;
use tokio::{
    sync::watch,
    time::{
        Instant,
        MissedTickBehavior,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

#[derive(Debug, Default, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("the scheduler can only be started once, it is {0}")]
    NotIdle(SchedulerState),
}

/// Outcome of one pass over the configured targets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The stop signal arrived before every target was visited.
    pub interrupted: bool,
}

/// Owns the interval timer and runs every target through fetch, parse, build and publish.
pub struct Scheduler {
    config: Arc<CollectionConfig>,
    fetcher: Box<dyn StatsFetcher>,
    events: EventBuilder,
    stats: Arc<CollectionStats>,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(config: Arc<CollectionConfig>, fetcher: Box<dyn StatsFetcher>, stats: Arc<CollectionStats>) -> Self {
        let events = EventBuilder::new(config.name.clone(), config.host.clone());
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            config,
            fetcher,
            events,
            stats,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Ticks every `period` until `stop` is cancelled. The first tick fires one period
    /// after the start.
    ///
    /// A command that is already running when `stop` fires is allowed to finish, the
    /// remaining targets of that tick are not visited.
    ///
    /// # Errors
    /// Fails if the scheduler has been started before.
    pub async fn run(&self, publisher: &mut dyn Publisher, stop: &CancellationToken) -> Result<(), SchedulerError> {
        let mut current = SchedulerState::Idle;
        let started = self.state.send_if_modified(|state| {
            current = *state;
            if *state != SchedulerState::Idle {
                return false;
            }
            *state = SchedulerState::Running;
            true
        });
        if !started {
            return Err(SchedulerError::NotIdle(current));
        }

        let period = self.config.period;
        info!(
            host = %self.config.host,
            ?period,
            targets = self.config.targets.len(),
            "Collection scheduler running"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        // A slow nodetool delays the following tick instead of causing a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tick += 1;
            self.stats.record_tick();
            let report = self
                .collect_once(publisher, stop)
                .instrument(debug_span!("tick", tick))
                .await;
            debug!(tick, ?report, stats = ?self.stats.snapshot(), "Tick finished");
        }

        self.state.send_replace(SchedulerState::Stopped);
        info!(ticks = tick, stats = ?self.stats.snapshot(), "Collection scheduler stopped");
        Ok(())
    }

    /// Visits every target once, in configured order. A failing target never keeps the
    /// others from being collected.
    pub async fn collect_once(&self, publisher: &mut dyn Publisher, stop: &CancellationToken) -> TickReport {
        let mut report = TickReport::default();

        for target in &self.config.targets {
            if stop.is_cancelled() {
                debug!(table = %target, "Stop requested, skipping the remaining tables");
                report.interrupted = true;
                break;
            }

            info!(table = %target, "Collecting table statistics");
            let event = match self.collect_target(target).await {
                Ok(Some(event)) => event,
                Ok(None) => {
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    self.stats.record_target_failure();
                    report.failed += 1;
                    error!(table = %target, "Collection failed: {err}");
                    continue;
                }
            };

            match publisher.publish(event).await {
                Ok(()) => {
                    self.stats.record_published();
                    report.published += 1;
                }
                Err(err) => {
                    self.stats.record_publish_failure();
                    report.failed += 1;
                    error!(table = %target, publisher = publisher.name(), "Failed to publish event: {err}");
                }
            }
        }

        report
    }

    /// Returns `None` when a degraded target is skipped by policy.
    async fn collect_target(&self, target: &CollectionTarget) -> Result<Option<MetricEvent>, ParseError> {
        self.stats.record_target();

        let output = match self.fetcher.fetch(&self.config.host, target).await {
            Ok(output) => output,
            Err(err) => {
                self.stats.record_fetch_failure();
                return Ok(self.degrade(target, self.config.on_fetch_error, "nodetool failed", &err));
            }
        };

        let metrics = match parser::parse(&output, target) {
            Ok(metrics) => metrics,
            Err(err) if err.is_decode() => {
                self.stats.record_decode_failure();
                return Ok(self.degrade(target, self.config.on_decode_error, "unreadable nodetool output", &err));
            }
            Err(err) => return Err(err),
        };

        Ok(Some(self.events.build(target, metrics)))
    }

    fn degrade(
        &self,
        target: &CollectionTarget,
        policy: DegradePolicy,
        reason: &str,
        err: &dyn std::error::Error,
    ) -> Option<MetricEvent> {
        match policy {
            DegradePolicy::Zero => {
                warn!(table = %target, "{reason}, publishing zeroed metrics: {err}");
                Some(self.events.build(target, ExtractedMetrics::zeroed()))
            }
            DegradePolicy::Skip => {
                warn!(table = %target, "{reason}, skipping this tick: {err}");
                None
            }
        }
    }
}
