// src/pipeline/mod.rs
// =============================================================================
// Announces written text files to the downstream pipeline.
//
// Each output file is announced once per crawl with the envelope
//   {"file_path": "<absolute path of the text file>"}
// on the scrapper_queue queue. Downstream consumers ack each message after
// processing it.
//
// The channel is handed in at construction. Pipeline mode without a
// channel is refused up front (PublishError::NotInitialized) instead of
// failing on the first publish.
// =============================================================================

mod channel;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::PublishError;

pub use channel::{Channel, MemoryChannel, SpoolChannel};

/// Queue the chunking stage consumes from.
pub const SCRAPER_QUEUE: &str = "scrapper_queue";

/// The message payload for one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishEnvelope {
    pub file_path: String,
}

pub struct Publisher {
    channel: Option<Box<dyn Channel>>,
    // output file names already announced in this crawl
    announced: HashSet<String>,
}

impl Publisher {
    /// A publisher that never sends anything.
    pub fn disabled() -> Self {
        Self {
            channel: None,
            announced: HashSet::new(),
        }
    }

    pub fn new(channel: Box<dyn Channel>) -> Self {
        Self {
            channel: Some(channel),
            announced: HashSet::new(),
        }
    }

    /// Builds the publisher for the configured mode.
    ///
    /// Pipeline mode needs a channel; asking for it without one is a setup bug.
    pub fn from_settings(
        use_pipeline: bool,
        channel: Option<Box<dyn Channel>>,
    ) -> Result<Self, PublishError> {
        match (use_pipeline, channel) {
            (false, _) => Ok(Self::disabled()),
            (true, Some(channel)) => Ok(Self::new(channel)),
            (true, None) => Err(PublishError::NotInitialized),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Publishes the envelope for `file_path` unless it was already announced.
    ///
    /// Returns Ok(true) when a message was sent.
    pub async fn publish(&mut self, file_path: &Path) -> Result<bool, PublishError> {
        let channel = match &self.channel {
            Some(channel) => channel,
            None => return Ok(false),
        };

        let key = match file_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => file_path.to_string_lossy().into_owned(),
        };
        if self.announced.contains(&key) {
            return Ok(false);
        }

        let envelope = PublishEnvelope {
            file_path: file_path.to_string_lossy().into_owned(),
        };
        let payload = serde_json::to_vec(&envelope)?;
        channel.publish(SCRAPER_QUEUE, &payload).await?;

        // Only mark as announced once the channel took it
        self.announced.insert(key);
        log::debug!("published {}", envelope.file_path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_pipeline_without_channel_is_refused() {
        assert!(matches!(
            Publisher::from_settings(true, None),
            Err(PublishError::NotInitialized)
        ));
        assert!(!Publisher::from_settings(false, None).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_publisher_is_a_no_op() {
        let mut publisher = Publisher::disabled();
        assert!(!publisher
            .publish(Path::new("/data/examplecom.txt"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_each_file_is_published_once() {
        let channel = MemoryChannel::new();
        let mut publisher = Publisher::new(Box::new(channel.clone()));
        let path = PathBuf::from("/data/examplecom.txt");

        assert!(publisher.publish(&path).await.unwrap());
        assert!(!publisher.publish(&path).await.unwrap());

        let messages = channel.drain(SCRAPER_QUEUE);
        assert_eq!(messages.len(), 1);
        let envelope: PublishEnvelope = serde_json::from_slice(&messages[0]).unwrap();
        assert_eq!(envelope.file_path, "/data/examplecom.txt");
        assert_eq!(
            String::from_utf8(messages[0].clone()).unwrap(),
            r#"{"file_path":"/data/examplecom.txt"}"#
        );
    }

    #[tokio::test]
    async fn test_failed_publish_is_retried_for_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let spool = SpoolChannel::open(dir.path()).await.unwrap();
        let queue_path = spool.queue_path(SCRAPER_QUEUE);
        std::fs::create_dir(&queue_path).unwrap();

        let mut publisher = Publisher::new(Box::new(spool));
        let path = PathBuf::from("/data/examplecom.txt");
        assert!(publisher.publish(&path).await.is_err());

        std::fs::remove_dir(&queue_path).unwrap();
        assert!(publisher.publish(&path).await.unwrap());
    }
}
