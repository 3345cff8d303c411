use eyre::{
    Context as _,
    Result,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const CRATES: [&str; 3] = ["cassandrabeat", "cassandrabeat_collector", "cassandrabeat_config"];

/// Logs go to stderr, stdout is reserved for the console output.
///
/// `RUST_LOG` wins over the `-v` count when set.
pub fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = CRATES
                .iter()
                .map(|krate| format!("{krate}={level}"))
                .chain(std::iter::once("warn".to_string()))
                .collect::<Vec<_>>()
                .join(",");
            EnvFilter::try_new(directives).context("Failed to build log filter")?
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .context("Failed to initialize tracing subscriber")
}
