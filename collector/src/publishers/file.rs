use super::{
    PublishError,
    Publisher,
};
use crate::event::MetricEvent;
use std::{
    future::Future,
    path::{
        Path,
        PathBuf,
    },
    pin::Pin,
};
use tokio::{
    fs::{
        File,
        OpenOptions,
    },
    io::{
        AsyncWriteExt as _,
        BufWriter,
    },
};

/// Appends one JSON document per line to a file.
pub struct FilePublisher {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FilePublisher {
    pub async fn open(path: &Path) -> Result<Self, PublishError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        debug!(path = %path.display(), "Opened event file");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }
}

impl Publisher for FilePublisher {
    fn publish(&mut self, event: MetricEvent) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            let writer = self.writer.as_mut().ok_or(PublishError::Closed)?;
            let mut line = serde_json::to_vec(&event)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            // Flushed per event so a crash never loses more than the event in flight.
            writer.flush().await?;
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut writer) = self.writer.take() {
                writer.flush().await?;
                writer.into_inner().sync_all().await?;
                debug!(path = %self.path.display(), "Closed event file");
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::EventBuilder,
        parser::ExtractedMetrics,
    };
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[tokio::test]
    async fn appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("out").join("events.ndjson");
        std::fs::create_dir_all(dir.child("out")).unwrap();
        std::fs::write(&path, "{\"existing\":true}\n").unwrap();

        let builder = EventBuilder::new("beat", "db-1");
        let mut publisher = FilePublisher::open(&path).await.unwrap();
        for name in ["ks1.t1", "ks1.t2"] {
            let event = builder.build(&name.parse().unwrap(), ExtractedMetrics::zeroed());
            publisher.publish(event).await.unwrap();
        }
        publisher.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        let tables = lines[1..]
            .iter()
            .map(|line| serde_json::from_str::<MetricEvent>(line).unwrap().table_name)
            .collect::<Vec<_>>();
        assert_eq!(tables, vec!["ks1.t1", "ks1.t2"]);
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("a").join("b").join("events.ndjson");
        let mut publisher = FilePublisher::open(&path).await.unwrap();
        publisher.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn closed_file_rejects_events() {
        let dir = TempDir::new().unwrap();
        let mut publisher = FilePublisher::open(&dir.child("events.ndjson")).await.unwrap();
        publisher.close().await.unwrap();
        publisher.close().await.unwrap();

        let event = EventBuilder::new("beat", "db-1").build(&"ks.t".parse().unwrap(), ExtractedMetrics::zeroed());
        assert!(matches!(publisher.publish(event).await, Err(PublishError::Closed)));
    }
}
