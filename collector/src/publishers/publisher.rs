use crate::event::MetricEvent;
use std::{
    future::Future,
    pin::Pin,
};

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("the publisher has been closed")]
    Closed,
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write event: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to send event: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint rejected event with status {0}")]
    Status(reqwest::StatusCode),
}

/// Downstream delivery of events.
///
/// Connected once before the first tick and closed once after the scheduler stopped.
/// `publish` after `close` fails with [`PublishError::Closed`], closing twice is a no-op.
pub trait Publisher: Send {
    fn publish(&mut self, event: MetricEvent) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;

    /// Get the name of this publisher
    fn name(&self) -> &'static str;
}
