//! # Publishers
//!
//! Delivery of built events. The scheduler hands every event to exactly one
//! [`Publisher`]; buffering and delivery guarantees are owned by the implementation.
//!
//! - **`ConsolePublisher`**: JSON lines on stdout
//! - **`FilePublisher`**: JSON lines appended to a file
//! - **`HttpPublisher`**: one JSON `POST` per event
//! - **`ChannelPublisher`**: forwards events into a tokio channel

pub mod channel;
pub mod console;
pub mod file;
pub mod http;
pub mod publisher;

pub use channel::ChannelPublisher;
pub use console::ConsolePublisher;
pub use file::FilePublisher;
pub use http::HttpPublisher;
pub use publisher::{
    PublishError,
    Publisher,
};

use cassandrabeat_config::Output;

/// Connects the publisher selected by the configuration.
pub async fn connect(output: &Output) -> Result<Box<dyn Publisher>, PublishError> {
    let publisher: Box<dyn Publisher> = match output {
        Output::Console => Box::new(ConsolePublisher::new()),
        Output::File { path } => Box::new(FilePublisher::open(path).await?),
        Output::Http { url } => Box::new(HttpPublisher::new(url.clone())?),
    };
    info!(publisher = publisher.name(), "Publisher connected");
    Ok(publisher)
}
