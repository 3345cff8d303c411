use super::{
    PublishError,
    Publisher,
};
use crate::event::MetricEvent;
use reqwest::Client;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts every event as a JSON body, e.g. to an Elasticsearch `<index>/_doc` endpoint.
pub struct HttpPublisher {
    url: Url,
    client: Option<Client>,
}

impl HttpPublisher {
    pub fn new(url: Url) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            url,
            client: Some(client),
        })
    }
}

impl Publisher for HttpPublisher {
    fn publish(&mut self, event: MetricEvent) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            let client = self.client.as_ref().ok_or(PublishError::Closed)?;
            let response = client.post(self.url.clone()).json(&event).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(%status, body, "Endpoint rejected event");
                return Err(PublishError::Status(status));
            }
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        self.client.take();
        Box::pin(std::future::ready(Ok(())))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
