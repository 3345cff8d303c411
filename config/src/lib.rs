//! # cassandrabeat configuration
//!
//! Configuration is layered with the `config` crate, later sources win:
//!
//! 1. the embedded `default-config.yaml`
//! 2. `config.yaml` in [`get_config_dir`], or the file given with `--config`
//! 3. command line arguments and their environment variables
//!
//! The layered [`Config`] is untrusted input. [`Config::validate`] turns it into
//! the immutable [`CollectionConfig`] the collector runs with, so malformed
//! tables or outputs are rejected before the first tick.

#[macro_use]
extern crate tracing;

mod app_config;
mod args;
pub mod duration_str;
mod policy;
mod target;

use app_config::AppConfig;
pub use app_config::get_config_dir;
pub use args::Args;
pub use policy::{
    DegradePolicy,
    OutputKind,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::PathBuf,
    time::Duration,
};
pub use target::{
    CollectionTarget,
    TargetError,
};
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    pub name: String,
    pub host: String,
    #[serde(with = "duration_str")]
    pub period: Duration,
    #[serde(default)]
    pub table: Vec<String>,
    pub nodetool: NodetoolConfig,
    #[serde(default)]
    pub on_fetch_error: DegradePolicy,
    #[serde(default)]
    pub on_decode_error: DegradePolicy,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodetoolConfig {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Upper bound for a single invocation, `0s` disables it.
    #[serde(with = "duration_str", default = "default_nodetool_timeout")]
    pub timeout: Duration,
}

fn default_nodetool_timeout() -> Duration {
    Duration::from_secs(30)
}

impl NodetoolConfig {
    pub fn invocation_timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub kind: OutputKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.display().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let source = match &args.config {
            Some(path) => config::File::from(path.as_path())
                .format(config::FileFormat::Yaml)
                .required(true),
            None => config::File::from(config_dir.join("config.yaml"))
                .format(config::FileFormat::Yaml)
                .required(false),
        };
        builder = builder.add_source(source);

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }

    /// Checks every value and produces the configuration the collector runs with.
    ///
    /// # Errors
    /// Returns the first invalid value found. Nothing is scheduled in that case.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> Result<CollectionConfig, ValidationError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if self.period.is_zero() {
            return Err(ValidationError::ZeroPeriod);
        }
        if self.nodetool.path.trim().is_empty() {
            return Err(ValidationError::EmptyNodetool);
        }

        let targets = self
            .table
            .iter()
            .map(|table| table.trim().parse::<CollectionTarget>())
            .collect::<Result<Vec<_>, _>>()?;
        if targets.is_empty() {
            return Err(ValidationError::NoTargets);
        }

        let output = match self.output.kind {
            OutputKind::Console => Output::Console,
            OutputKind::File => {
                let path = self.output.path.clone().ok_or(ValidationError::MissingOutputPath)?;
                Output::File { path }
            }
            OutputKind::Http => {
                let raw = self.output.url.as_deref().ok_or(ValidationError::MissingOutputUrl)?;
                let url = Url::parse(raw).map_err(|source| ValidationError::InvalidOutputUrl {
                    url: raw.to_string(),
                    source,
                })?;
                Output::Http { url }
            }
        };

        debug!(targets = targets.len(), ?output, "Configuration is valid");

        Ok(CollectionConfig {
            name: self.name.clone(),
            host: host.to_string(),
            period: self.period,
            targets,
            nodetool: self.nodetool.clone(),
            on_fetch_error: self.on_fetch_error,
            on_decode_error: self.on_decode_error,
            output,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("`host` must not be empty")]
    EmptyHost,
    #[error("`period` must be greater than zero")]
    ZeroPeriod,
    #[error("`nodetool.path` must not be empty")]
    EmptyNodetool,
    #[error("at least one `table` must be configured")]
    NoTargets,
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("`output.path` is required for the file output")]
    MissingOutputPath,
    #[error("`output.url` is required for the http output")]
    MissingOutputUrl,
    #[error("`output.url` '{url}' is not a valid URL: {source}")]
    InvalidOutputUrl { url: String, source: url::ParseError },
}

/// Destination of published events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Output {
    Console,
    File { path: PathBuf },
    Http { url: Url },
}

/// Validated, read-once configuration. Never changes for the lifetime of the process.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionConfig {
    pub name: String,
    pub host: String,
    #[serde(with = "duration_str")]
    pub period: Duration,
    #[serde(rename = "table")]
    pub targets: Vec<CollectionTarget>,
    pub nodetool: NodetoolConfig,
    pub on_fetch_error: DegradePolicy,
    pub on_decode_error: DegradePolicy,
    pub output: Output,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn config_with_tables(tables: &[&str]) -> Config {
        Config {
            table: tables.iter().map(|t| t.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn embedded_defaults() {
        let config = Config::default();
        assert_eq!(config.name, "cassandrabeat");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.period, Duration::from_secs(10));
        assert_eq!(config.nodetool.path, "nodetool");
        assert_eq!(config.nodetool.invocation_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.on_fetch_error, DegradePolicy::Zero);
        assert_eq!(config.on_decode_error, DegradePolicy::Zero);
        assert_eq!(config.output.kind, OutputKind::Console);
        assert!(config.table.is_empty());
    }

    #[test]
    fn validate_keeps_table_order() {
        let collection = config_with_tables(&["ks1.t1", "ks2.t2", "ks1.t0"]).validate().unwrap();
        let names = collection
            .targets
            .iter()
            .map(CollectionTarget::qualified_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["ks1.t1", "ks2.t2", "ks1.t0"]);
        assert_eq!(collection.output, Output::Console);
    }

    #[test]
    fn validate_rejects_malformed_tables() {
        for table in ["ks1", "ks1.t1.x", ".t1", "ks1."] {
            let err = config_with_tables(&["ok.table", table]).validate().unwrap_err();
            assert!(
                matches!(err, ValidationError::Target(TargetError::Malformed(ref raw)) if raw == table),
                "unexpected error for {table:?}: {err}"
            );
        }
    }

    #[test]
    fn validate_requires_tables_host_and_period() {
        assert!(matches!(
            config_with_tables(&[]).validate(),
            Err(ValidationError::NoTargets)
        ));

        let mut config = config_with_tables(&["ks.t"]);
        config.host = "  ".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::EmptyHost)));

        let mut config = config_with_tables(&["ks.t"]);
        config.period = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ValidationError::ZeroPeriod)));
    }

    #[test]
    fn validate_output_requirements() {
        let mut config = config_with_tables(&["ks.t"]);
        config.output.kind = OutputKind::File;
        assert!(matches!(config.validate(), Err(ValidationError::MissingOutputPath)));
        config.output.path = Some(PathBuf::from("/tmp/events.ndjson"));
        assert_eq!(
            config.validate().unwrap().output,
            Output::File {
                path: PathBuf::from("/tmp/events.ndjson")
            }
        );

        config.output.kind = OutputKind::Http;
        assert!(matches!(config.validate(), Err(ValidationError::MissingOutputUrl)));
        config.output.url = Some("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidOutputUrl { .. })
        ));
        config.output.url = Some("http://localhost:9200/cassandrabeat/_doc".to_string());
        assert!(matches!(config.validate().unwrap().output, Output::Http { .. }));
    }

    #[test]
    fn zero_timeout_disables_the_bound() {
        let nodetool = NodetoolConfig {
            path: "nodetool".to_string(),
            port: None,
            timeout: Duration::ZERO,
        };
        assert_eq!(nodetool.invocation_timeout(), None);
    }

    #[test]
    fn file_then_args_layering() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("cassandrabeat.yaml");
        std::fs::write(
            &path,
            "host: cassandra-1\nperiod: 1m\ntable:\n  - ks1.t1\n  - ks1.t2\nnodetool:\n  path: /opt/cassandra/bin/nodetool\n  port: 7199\non_decode_error: skip\n",
        )
        .unwrap();

        let config = Config::new(Args {
            config: Some(path.clone()),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(config.host, "cassandra-1");
        assert_eq!(config.period, Duration::from_secs(60));
        assert_eq!(config.table, vec!["ks1.t1".to_string(), "ks1.t2".to_string()]);
        assert_eq!(config.nodetool.path, "/opt/cassandra/bin/nodetool");
        assert_eq!(config.nodetool.port, Some(7199));
        // Not set in the file, so the embedded default survives.
        assert_eq!(config.nodetool.timeout, Duration::from_secs(30));
        assert_eq!(config.on_decode_error, DegradePolicy::Skip);
        assert_eq!(config.on_fetch_error, DegradePolicy::Zero);

        let config = Config::new(Args {
            config: Some(path),
            host: Some("cassandra-2".to_string()),
            period: Some("5s".to_string()),
            tables: vec!["ks9.t9".to_string()],
            output: Some(OutputKind::File),
            output_path: Some(PathBuf::from("/var/log/cassandrabeat.ndjson")),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(config.host, "cassandra-2");
        assert_eq!(config.period, Duration::from_secs(5));
        assert_eq!(config.table, vec!["ks9.t9".to_string()]);
        assert_eq!(config.output.kind, OutputKind::File);

        let collection = config.validate().unwrap();
        assert_eq!(collection.targets, vec!["ks9.t9".parse::<CollectionTarget>().unwrap()]);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let result = Config::new(Args {
            config: Some(dir.child("missing.yaml")),
            ..Args::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn invalid_period_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("cassandrabeat.yaml");
        std::fs::write(&path, "period: soon\n").unwrap();
        let result = Config::new(Args {
            config: Some(path),
            ..Args::default()
        });
        assert!(result.is_err());
    }
}
