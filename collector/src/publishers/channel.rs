use super::{
    PublishError,
    Publisher,
};
use crate::event::MetricEvent;
use std::{
    future::Future,
    pin::Pin,
};
use tokio::sync::mpsc::{
    unbounded_channel,
    UnboundedReceiver,
    UnboundedSender,
};

/// Forwards events into a channel, for embedding the collector in another process.
///
/// Closing drops the sender, so the receiving side observes the end of the stream.
pub struct ChannelPublisher {
    sender: Option<UnboundedSender<MetricEvent>>,
}

impl ChannelPublisher {
    pub fn new() -> (Self, UnboundedReceiver<MetricEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender: Some(sender) }, receiver)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&mut self, event: MetricEvent) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let result = match &self.sender {
            Some(sender) => sender.send(event).map_err(|_| PublishError::Closed),
            None => Err(PublishError::Closed),
        };
        Box::pin(std::future::ready(result))
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        self.sender.take();
        Box::pin(std::future::ready(Ok(())))
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
