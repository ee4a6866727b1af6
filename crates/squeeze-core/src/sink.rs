//! Downstream sinks for grouped records.
//!
//! A [`RecordSink`] receives `(GroupingKey, payload)` pairs from the grouping stage and
//! must deliver every pair sharing a key to the same aggregation unit.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::grouping::GroupingKey;

/// Accepts grouped records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Emits `payload` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the record cannot be delivered.
    async fn emit(&self, key: GroupingKey, payload: Bytes) -> Result<()>;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    async fn emit(&self, key: GroupingKey, payload: Bytes) -> Result<()> {
        (**self).emit(key, payload).await
    }
}

/// In-memory aggregation: coalesces every payload sharing a key.
///
/// Safe to share between concurrent mappers. Payloads keep their emission order
/// within a key.
#[derive(Debug, Default)]
pub struct GroupCollector {
    groups: Mutex<BTreeMap<GroupingKey, Vec<Bytes>>>,
}

impl GroupCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the groups collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the collector lock is poisoned.
    pub fn groups(&self) -> Result<BTreeMap<GroupingKey, Vec<Bytes>>> {
        Ok(self.lock()?.clone())
    }

    /// Consumes the collector and returns its groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the collector lock is poisoned.
    pub fn into_groups(self) -> Result<BTreeMap<GroupingKey, Vec<Bytes>>> {
        self.groups.into_inner().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }

    /// Number of distinct keys seen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the collector lock is poisoned.
    pub fn group_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<GroupingKey, Vec<Bytes>>>> {
        self.groups.lock().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }
}

#[async_trait]
impl RecordSink for GroupCollector {
    async fn emit(&self, key: GroupingKey, payload: Bytes) -> Result<()> {
        self.lock()?.entry(key).or_default().push(payload);
        Ok(())
    }
}

/// Forwards grouped records over a bounded channel to a separate aggregation task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<(GroupingKey, Bytes)>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the aggregation task reads from.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<(GroupingKey, Bytes)>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RecordSink for ChannelSink {
    async fn emit(&self, key: GroupingKey, payload: Bytes) -> Result<()> {
        self.tx.send((key, payload)).await.map_err(|_| Error::Sink {
            message: "downstream receiver closed".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collector_coalesces_by_key() {
        let sink = GroupCollector::new();
        let a = GroupingKey::Directory("/s/a".into());
        let rollup = GroupingKey::Rollup("/s".into());

        sink.emit(a.clone(), Bytes::from_static(b"1")).await.unwrap();
        sink.emit(rollup.clone(), Bytes::from_static(b"2")).await.unwrap();
        sink.emit(a.clone(), Bytes::from_static(b"3")).await.unwrap();

        assert_eq!(sink.group_count().unwrap(), 2);
        let groups = sink.into_groups().unwrap();
        assert_eq!(
            groups[&a],
            vec![Bytes::from_static(b"1"), Bytes::from_static(b"3")]
        );
        assert_eq!(groups[&rollup], vec![Bytes::from_static(b"2")]);
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_records() {
        let (sink, mut rx) = ChannelSink::bounded(4);
        let key = GroupingKey::Rollup("/s".into());

        sink.emit(key.clone(), Bytes::from_static(b"payload"))
            .await
            .unwrap();

        let (received_key, payload) = rx.recv().await.expect("record");
        assert_eq!(received_key, key);
        assert_eq!(payload, Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_channel_sink_fails_when_receiver_dropped() {
        let (sink, rx) = ChannelSink::bounded(1);
        drop(rx);

        let err = sink
            .emit(GroupingKey::Directory("/s".into()), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sink { .. }));
    }
}
