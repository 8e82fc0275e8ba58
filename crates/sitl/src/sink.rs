//! Publishes land detection records on a tokio watch channel.

use land_detector_core::detector::{LandDetected, LandDetectedSink};
use tokio::sync::watch;

/// Output sink keeping the latest published record.
///
/// Subscribers see every publish as a change, including republication of an
/// unchanged record.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Option<LandDetected>>,
    published: u64,
}

impl WatchSink {
    /// Create a sink and its first receiver.
    pub fn channel() -> (Self, watch::Receiver<Option<LandDetected>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx, published: 0 }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LandDetected>> {
        self.tx.subscribe()
    }

    /// Number of records published so far
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl LandDetectedSink for WatchSink {
    fn publish(&mut self, record: &LandDetected) {
        self.tx.send_replace(Some(*record));
        self.published += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_marks_changed() {
        let (mut sink, mut rx) = WatchSink::channel();
        assert!(rx.borrow_and_update().is_none());

        let record = LandDetected {
            timestamp_us: 42,
            ..Default::default()
        };
        sink.publish(&record);
        sink.publish(&record);

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(record));
        assert_eq!(sink.published(), 2);
    }

    #[test]
    fn test_publish_without_receivers() {
        let (mut sink, rx) = WatchSink::channel();
        drop(rx);
        sink.publish(&LandDetected::default());
        assert_eq!(sink.published(), 1);
        assert!(sink.subscribe().borrow().is_some());
    }
}
