// src/pipeline/channel.rs
// =============================================================================
// Outbound message channels.
//
// The publisher only needs "put these bytes on that queue". Two channels
// ship with the crawler:
// - MemoryChannel: in-process queues, for embedding and tests
// - SpoolChannel: one append-only JSON-lines file per queue, which a
//   downstream consumer (or a broker bridge) tails
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::PublishError;

/// A named-queue publish endpoint.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Queues held in memory. Clones share the same queues.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    queues: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every message published to `queue` so far.
    pub fn drain(&self, queue: &str) -> Vec<Vec<u8>> {
        match self.queues.lock() {
            Ok(mut queues) => queues.remove(queue).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self, queue: &str) -> usize {
        match self.queues.lock() {
            Ok(queues) => queues.get(queue).map(Vec::len).unwrap_or(0),
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), PublishError> {
        let mut queues = self.queues.lock().map_err(|_| PublishError::Channel {
            queue: queue.to_string(),
            message: "memory channel lock poisoned".to_string(),
        })?;
        queues
            .entry(queue.to_string())
            .or_default()
            .push(payload.to_vec());
        Ok(())
    }
}

/// Appends each message as one line to `<dir>/<queue>.jsonl`.
#[derive(Debug, Clone)]
pub struct SpoolChannel {
    dir: PathBuf,
}

impl SpoolChannel {
    /// Opens (and creates if needed) the spool directory.
    pub async fn open(dir: &Path) -> Result<Self, PublishError> {
        fs::create_dir_all(dir).await.map_err(|e| PublishError::Channel {
            queue: dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn queue_path(&self, queue: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", queue))
    }
}

#[async_trait]
impl Channel for SpoolChannel {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), PublishError> {
        let to_error = |e: std::io::Error| PublishError::Channel {
            queue: queue.to_string(),
            message: e.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.queue_path(queue))
            .await
            .map_err(to_error)?;

        let mut line = payload.to_vec();
        line.push(b'\n');
        file.write_all(&line).await.map_err(to_error)?;
        file.flush().await.map_err(to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_channel_keeps_queues_apart() {
        let channel = MemoryChannel::new();
        channel.publish("a", b"1").await.unwrap();
        channel.publish("a", b"2").await.unwrap();
        channel.publish("b", b"3").await.unwrap();

        assert_eq!(channel.len("a"), 2);
        assert_eq!(channel.drain("a"), vec![b"1".to_vec(), b"2".to_vec()]);
        assert_eq!(channel.len("a"), 0);
        assert_eq!(channel.len("b"), 1);
    }

    #[tokio::test]
    async fn test_spool_channel_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let channel = SpoolChannel::open(&dir.path().join("queue")).await.unwrap();
        channel.publish("q", br#"{"file_path":"/a"}"#).await.unwrap();
        channel.publish("q", br#"{"file_path":"/b"}"#).await.unwrap();

        let content = std::fs::read_to_string(channel.queue_path("q")).unwrap();
        assert_eq!(content, "{\"file_path\":\"/a\"}\n{\"file_path\":\"/b\"}\n");
    }

    #[tokio::test]
    async fn test_spool_channel_reports_unwritable_queue() {
        let dir = tempfile::tempdir().unwrap();
        let channel = SpoolChannel::open(dir.path()).await.unwrap();
        // a directory in place of the queue file
        std::fs::create_dir(channel.queue_path("q")).unwrap();

        let result = channel.publish("q", b"{}").await;
        assert!(matches!(result, Err(PublishError::Channel { .. })));
    }
}
