use super::{
    PublishError,
    Publisher,
};
use crate::event::MetricEvent;
use std::{
    future::Future,
    pin::Pin,
};
use tokio::io::{
    AsyncWriteExt as _,
    Stdout,
};

/// Writes one JSON document per line to stdout.
pub struct ConsolePublisher {
    stdout: Option<Stdout>,
}

impl ConsolePublisher {
    pub fn new() -> Self {
        Self {
            stdout: Some(tokio::io::stdout()),
        }
    }
}

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for ConsolePublisher {
    fn publish(&mut self, event: MetricEvent) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            let stdout = self.stdout.as_mut().ok_or(PublishError::Closed)?;
            let mut line = serde_json::to_vec(&event)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut stdout) = self.stdout.take() {
                stdout.flush().await?;
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
