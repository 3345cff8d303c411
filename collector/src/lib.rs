//! # cassandrabeat collector
//!
//! Periodically reads `nodetool cfstats` for a static list of tables and publishes
//! one event per table.
//!
//! ## Architecture
//!
//! - **`fetcher`**: runs nodetool for one table and returns its raw output
//! - **`parser`**: decodes the output and extracts the keyspace counters and the table block
//! - **`event`**: stamps extracted metrics with a timestamp and labels
//! - **`publishers`**: delivery of events (console, file, http, channel)
//! - **`scheduler`**: the only loop, ticks and drives the steps above one table at a time
//! - **`beat`**: owns scheduler and publisher for the lifetime of the process
//!
//! ## Failure handling
//!
//! - A nodetool failure or undecodable output degrades the table per policy
//!   (zeroed event or skipped) and is counted in [`CollectionStats`]
//! - A keyspace missing from the output fails that table alone
//! - Nothing short of the stop signal ends the loop

#[macro_use]
extern crate tracing;

pub mod beat;
pub mod event;
pub mod fetcher;
pub mod parser;
pub mod publishers;
pub mod scheduler;
pub mod stats;

pub use beat::Beat;
pub use event::{
    EventBuilder,
    MetricEvent,
};
pub use fetcher::{
    FetchError,
    NodetoolFetcher,
    StatsFetcher,
};
pub use parser::{
    ExtractedMetrics,
    ParseError,
    RawStats,
};
pub use publishers::{
    PublishError,
    Publisher,
};
pub use scheduler::{
    Scheduler,
    SchedulerState,
    TickReport,
};
pub use stats::{
    CollectionStats,
    StatsSnapshot,
};
