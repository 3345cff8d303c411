use cassandrabeat_config::{
    CollectionTarget,
    NodetoolConfig,
};
use std::{
    future::Future,
    io,
    path::PathBuf,
    pin::Pin,
    process::{
        ExitStatus,
        Stdio,
    },
    time::Duration,
};
use tokio::process::Command;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("failed to run `{program}`: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Source of raw per-table statistics.
pub trait StatsFetcher: Send + Sync {
    /// Returns the raw statistics document for `target` as reported by `host`.
    fn fetch<'a>(
        &'a self,
        host: &'a str,
        target: &'a CollectionTarget,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;
}

/// Runs `nodetool -h <host> cfstats -F json <keyspace>.<table>`.
#[derive(Debug, Clone)]
pub struct NodetoolFetcher {
    program: PathBuf,
    port: Option<u16>,
    timeout: Option<Duration>,
}

impl NodetoolFetcher {
    pub fn new(config: &NodetoolConfig) -> Self {
        let program = match which::which(&config.path) {
            Ok(path) => {
                debug!(path = %path.display(), "Resolved nodetool");
                path
            }
            Err(err) => {
                warn!(path = %config.path, "nodetool not found ({err}), every collection will fail until it is installed");
                PathBuf::from(&config.path)
            }
        };

        Self {
            program,
            port: config.port,
            timeout: config.invocation_timeout(),
        }
    }

    fn args(&self, host: &str, target: &CollectionTarget) -> Vec<String> {
        let mut args = vec!["-h".to_string(), host.to_string()];
        if let Some(port) = self.port {
            args.extend(["-p".to_string(), port.to_string()]);
        }
        args.extend([
            "cfstats".to_string(),
            "-F".to_string(),
            "json".to_string(),
            target.qualified_name(),
        ]);
        args
    }

    async fn run(&self, host: &str, target: &CollectionTarget) -> Result<Vec<u8>, FetchError> {
        let program = self.program.display().to_string();
        let mut command = Command::new(&self.program);
        command
            .args(self.args(host, target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed out invocation is dropped, which must not leave the process behind.
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, command.output())
                .await
                .map_err(|_| FetchError::Timeout {
                    program: program.clone(),
                    timeout,
                })?,
            None => command.output().await,
        }
        .map_err(|source| FetchError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(FetchError::Exit {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        trace!(table = %target, bytes = output.stdout.len(), "nodetool finished");
        Ok(output.stdout)
    }
}

impl StatsFetcher for NodetoolFetcher {
    fn fetch<'a>(
        &'a self,
        host: &'a str,
        target: &'a CollectionTarget,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>> {
        Box::pin(self.run(host, target))
    }
}
