use crate::OutputKind;
use clap::Parser;
use std::path::PathBuf;

/// Periodically ships nodetool cfstats counters as events.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Configuration file to load instead of `config.yaml` in the config directory.
    #[clap(long, short = 'c', value_name = "FILE", env = "CASSANDRABEAT_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Cassandra host passed to `nodetool -h`.
    #[clap(long, value_name = "HOST", env = "CASSANDRABEAT_HOST")]
    pub host: Option<String>,

    /// Collection period (e.g. "10s", "1m").
    #[clap(long, value_name = "DURATION", env = "CASSANDRABEAT_PERIOD")]
    pub period: Option<String>,

    /// Table to monitor as <keyspace>.<table>. Repeat to monitor several tables.
    /// Replaces the list from the configuration file.
    #[clap(long = "table", short = 't', value_name = "KEYSPACE.TABLE", env = "CASSANDRABEAT_TABLES", value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Path or name of the nodetool executable.
    #[clap(long, value_name = "PATH", env = "CASSANDRABEAT_NODETOOL")]
    pub nodetool: Option<String>,

    /// Where events are published.
    #[clap(long, value_name = "KIND")]
    pub output: Option<OutputKind>,

    /// File that events are appended to when the output is `file`.
    #[clap(long = "output-path", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Endpoint that events are posted to when the output is `http`.
    #[clap(long = "output-url", value_name = "URL")]
    pub output_url: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Validate the configuration, print it and exit.
    #[clap(long = "check-config", action)]
    pub check_config: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(host) = &self.host {
                cache.insert("host".to_string(), host.clone().into());
            }
            if let Some(period) = &self.period {
                cache.insert("period".to_string(), period.clone().into());
            }
            if !self.tables.is_empty() {
                cache.insert("table".to_string(), self.tables.clone().into());
            }
            if let Some(nodetool) = &self.nodetool {
                cache.insert("nodetool.path".to_string(), nodetool.clone().into());
            }
            if let Some(output) = &self.output {
                cache.insert("output.kind".to_string(), output.to_string().into());
            }
            if let Some(path) = &self.output_path {
                cache.insert("output.path".to_string(), path.display().to_string().into());
            }
            if let Some(url) = &self.output_url {
                cache.insert("output.url".to_string(), url.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let version = clap::crate_version!();
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "\
{version}

Authors: {author}

Config directory: {config_dir_path}"
    )
}
