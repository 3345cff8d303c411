//! Decoding of `nodetool cfstats -F json` output.
//!
//! The document is keyed by keyspace name:
//!
//! ```json
//! {
//!   "ks1": {
//!     "read_count": 10,
//!     "read_latency_ms": 0.42,
//!     "write_count": 5,
//!     "write_latency_ms": null,
//!     "tables": { "t1": { "sstables": 3 } }
//!   }
//! }
//! ```
//!
//! Keyspace blocks are decoded lazily and only for the keyspace a target asks for,
//! so unrelated keyspaces with an unexpected layout never fail a collection.

use cassandrabeat_config::CollectionTarget;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("output is not a JSON document: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("keyspace `{0}` is missing from the output")]
    MissingKeyspace(String),
    #[error("keyspace `{keyspace}` has no `{field}`")]
    MissingField { keyspace: String, field: &'static str },
    #[error("keyspace `{keyspace}` does not have the expected layout: {source}")]
    Schema {
        keyspace: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// Decode failures are degraded by policy, everything else fails the target.
    pub fn is_decode(&self) -> bool {
        matches!(self, ParseError::Decode(_))
    }
}

/// The decoded document, keyspace name to its undecoded statistics block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawStats(BTreeMap<String, Value>);

impl RawStats {
    pub fn decode(bytes: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(bytes).map_err(ParseError::Decode)
    }

    pub fn keyspace(&self, keyspace: &str) -> Result<KeyspaceStats, ParseError> {
        let block = self
            .0
            .get(keyspace)
            .ok_or_else(|| ParseError::MissingKeyspace(keyspace.to_string()))?;
        KeyspaceStats::deserialize(block).map_err(|source| ParseError::Schema {
            keyspace: keyspace.to_string(),
            source,
        })
    }
}

/// Statistics block of one keyspace. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyspaceStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub read_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub read_latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub write_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub write_latency_ms: Option<f64>,
    #[serde(default)]
    pub tables: BTreeMap<String, Value>,
}

/// Counters of one target, serialized with the names they carry in a published event.
/// Non-finite values go out as strings (`"NaN"`, `"inf"`), JSON has no number for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetrics {
    #[serde(rename = "keyspace_read_count", with = "non_finite")]
    pub read_count: f64,
    #[serde(rename = "keyspace_read_latency_ms", with = "non_finite")]
    pub read_latency_ms: f64,
    #[serde(rename = "keyspace_write_count", with = "non_finite")]
    pub write_count: f64,
    #[serde(rename = "keyspace_write_latency_ms", with = "non_finite")]
    pub write_latency_ms: f64,
    /// Per-table block exactly as reported, `None` when the table is not listed.
    pub table: Option<Value>,
}

impl ExtractedMetrics {
    /// Metrics reported for a target whose statistics were unavailable this tick.
    pub fn zeroed() -> Self {
        Self {
            read_count: 0.0,
            read_latency_ms: 0.0,
            write_count: 0.0,
            write_latency_ms: 0.0,
            table: None,
        }
    }

    pub fn from_keyspace(keyspace: &str, table: &str, mut stats: KeyspaceStats) -> Result<Self, ParseError> {
        let read_count = stats.read_count.ok_or_else(|| ParseError::MissingField {
            keyspace: keyspace.to_string(),
            field: "read_count",
        })?;
        let write_count = stats.write_count.ok_or_else(|| ParseError::MissingField {
            keyspace: keyspace.to_string(),
            field: "write_count",
        })?;

        let table_stats = stats.tables.remove(table);
        if table_stats.is_none() {
            debug!(keyspace, table, "Table is not listed in the keyspace statistics");
        }

        Ok(Self {
            read_count,
            read_latency_ms: stats.read_latency_ms.unwrap_or(0.0),
            write_count,
            write_latency_ms: stats.write_latency_ms.unwrap_or(0.0),
            table: table_stats,
        })
    }
}

/// Decodes `bytes` and projects the statistics `target` asks for.
pub fn parse(bytes: &[u8], target: &CollectionTarget) -> Result<ExtractedMetrics, ParseError> {
    let raw = RawStats::decode(bytes)?;
    let stats = raw.keyspace(target.keyspace())?;
    ExtractedMetrics::from_keyspace(target.keyspace(), target.table(), stats)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| E::custom(format!("'{s}' is not a number: {e}"))),
        }
    }
}

/// Accepts numbers, `null` and numeric strings. nodetool prints latencies of idle
/// tables as `"NaN"`, which is passed through unchanged.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(|n| n.into_f64::<D::Error>())
        .transpose()
}

mod non_finite {
    use super::NumberOrText;
    use serde::{
        Deserialize as _,
        Deserializer,
        Serializer,
    };

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.collect_str(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        NumberOrText::deserialize(deserializer)?.into_f64()
    }
}
