use crate::parser::ExtractedMetrics;
use cassandrabeat_config::CollectionTarget;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

pub const EVENT_TYPE: &str = "cassandrabeat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatInfo {
    pub name: String,
    pub version: String,
}

/// One published record for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub beat: BeatInfo,
    /// Cassandra host the statistics were read from.
    pub host: String,
    pub keyspace_name: String,
    /// Qualified `<keyspace>.<table>` name.
    pub table_name: String,
    #[serde(flatten)]
    pub metrics: ExtractedMetrics,
}

/// Stamps extracted metrics with the labels shared by every event of this process.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    beat: BeatInfo,
    host: String,
}

impl EventBuilder {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            beat: BeatInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            host: host.into(),
        }
    }

    /// Builds the event, capturing the timestamp now. Targets of one tick therefore
    /// carry slightly different timestamps.
    pub fn build(&self, target: &CollectionTarget, metrics: ExtractedMetrics) -> MetricEvent {
        self.build_at(Utc::now(), target, metrics)
    }

    pub fn build_at(&self, timestamp: DateTime<Utc>, target: &CollectionTarget, metrics: ExtractedMetrics) -> MetricEvent {
        MetricEvent {
            timestamp,
            kind: EVENT_TYPE.to_string(),
            beat: self.beat.clone(),
            host: self.host.clone(),
            keyspace_name: target.keyspace().to_string(),
            table_name: target.qualified_name(),
            metrics,
        }
    }
}
