use crate::{
    fetcher::{
        NodetoolFetcher,
        StatsFetcher,
    },
    publishers::{
        self,
        Publisher,
    },
    scheduler::{
        Scheduler,
        SchedulerState,
    },
    stats::{
        CollectionStats,
        StatsSnapshot,
    },
};
use cassandrabeat_config::CollectionConfig;
use eyre::{
    Context as _,
    Result,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// The collector instance of a process: scheduler, publisher and counters.
///
/// Built once at startup and consumed by [`Beat::run`], which closes the publisher
/// after the scheduler has stopped. Nothing can publish after that point.
pub struct Beat {
    scheduler: Scheduler,
    publisher: Box<dyn Publisher>,
    stats: Arc<CollectionStats>,
}

impl Beat {
    /// Resolves nodetool and connects the configured publisher.
    pub async fn new(config: CollectionConfig) -> Result<Self> {
        let fetcher = NodetoolFetcher::new(&config.nodetool);
        let publisher = publishers::connect(&config.output)
            .await
            .wrap_err_with(|| format!("Failed to connect the {:?} output", config.output))?;
        Ok(Self::with_parts(config, Box::new(fetcher), publisher))
    }

    pub fn with_parts(config: CollectionConfig, fetcher: Box<dyn StatsFetcher>, publisher: Box<dyn Publisher>) -> Self {
        let stats = Arc::new(CollectionStats::new());
        let scheduler = Scheduler::new(Arc::new(config), fetcher, stats.clone());
        Self {
            scheduler,
            publisher,
            stats,
        }
    }

    pub fn stats(&self) -> Arc<CollectionStats> {
        self.stats.clone()
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.scheduler.state()
    }

    /// Collects until `stop` is cancelled, then closes the publisher exactly once.
    pub async fn run(mut self, stop: CancellationToken) -> Result<StatsSnapshot> {
        let result = self.scheduler.run(self.publisher.as_mut(), &stop).await;

        debug!(publisher = self.publisher.name(), "Closing publisher");
        if let Err(err) = self.publisher.close().await {
            error!(publisher = self.publisher.name(), "Failed to close publisher: {err}");
        }

        result.wrap_err("Collection scheduler failed")?;
        Ok(self.stats.snapshot())
    }
}
