use cassandrabeat_collector::Beat;
use cassandrabeat_config::{
    Args,
    CollectionConfig,
    Config,
};
use color_eyre::Result;
use eyre::Context as _;
use tokio_util::sync::CancellationToken;

pub struct App {
    args: Args,
}

impl App {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Loads and validates the configuration. Any error here is fatal and happens
    /// before a single nodetool invocation.
    pub fn load_config(&self) -> Result<CollectionConfig> {
        let config = Config::new(self.args.clone()).wrap_err("Failed to load configuration")?;
        let collection = config.validate().wrap_err("Invalid configuration")?;
        Ok(collection)
    }

    pub async fn run(self) -> Result<()> {
        let collection = self.load_config()?;

        if self.args.check_config {
            let rendered = serde_yml::to_string(&collection).wrap_err("Failed to render configuration")?;
            print!("{rendered}");
            return Ok(());
        }

        let beat = Beat::new(collection).await?;
        let stop = CancellationToken::new();
        tokio::spawn(cancel_on_signal(stop.clone()));

        info!("cassandrabeat is running! Hit CTRL-C to stop it.");
        let result = beat.run(stop.clone()).await;
        // The signal task only exits on a signal, make sure it does not outlive the run.
        stop.cancel();

        let snapshot = result?;
        info!(?snapshot, "cassandrabeat stopped");
        Ok(())
    }
}

async fn cancel_on_signal(stop: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = stop.cancelled() => return,
        _ = ctrl_c => info!("Received CTRL-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
    stop.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use temp_dir::TempDir;

    fn args_for(content: &str) -> (TempDir, Args) {
        let dir = TempDir::new().unwrap();
        let path = dir.child("cassandrabeat.yaml");
        std::fs::write(&path, content).unwrap();
        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        (dir, args)
    }

    #[test]
    fn loads_validated_configuration() {
        let (_dir, args) = args_for("host: db-1\nperiod: 30s\ntable: [ks1.t1, ks2.t2]\n");
        let collection = App::new(args).load_config().unwrap();
        assert_eq!(collection.host, "db-1");
        assert_eq!(collection.period, Duration::from_secs(30));
        assert_eq!(collection.targets.len(), 2);
    }

    #[tokio::test]
    async fn malformed_table_fails_before_collecting() {
        let (_dir, args) = args_for("table: [ks1.t1, not-qualified]\nnodetool:\n  path: /nonexistent/nodetool\n");
        let err = App::new(args).run().await.unwrap_err();
        assert!(format!("{err:?}").contains("not-qualified"), "{err:?}");
    }

    #[tokio::test]
    async fn check_config_exits_without_collecting() {
        let (_dir, mut args) = args_for("table: [ks1.t1]\nnodetool:\n  path: /nonexistent/nodetool\n");
        args.check_config = true;
        App::new(args).run().await.unwrap();
    }
}
