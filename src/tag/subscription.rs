use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::utils::CancelToken;

use super::{ReadResult, StoreError, TagData, TagStore};

/// A tag whose value differs from the previous poll
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagChange {
    pub(crate) tag: TagData,
    pub(crate) value: Option<ReadResult>,
}

/// Change feed for a fixed set of tags.
///
/// A background thread reads the tags every `interval` and queues one
/// [`TagChange`] per changed tag, in the order the changes were seen. Values
/// present when the subscription starts are the baseline and are not reported.
/// Dropping the subscription stops and joins the thread.
pub(crate) struct Subscription {
    events: Receiver<Result<TagChange, StoreError>>,
    stop: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn start(
        store: Arc<dyn TagStore>,
        tags: Vec<TagData>,
        interval: Duration,
    ) -> Result<Self, StoreError> {
        let baseline = tags
            .iter()
            .map(|tag| store.read(&tag.path))
            .collect::<Result<Vec<_>, _>>()?;

        let (tx, rx) = mpsc::channel();
        let stop = CancelToken::new();
        let worker_stop = stop.clone();
        tracing::debug!(tags = tags.len(), ?interval, "starting tag subscription");
        let worker = std::thread::spawn(move || {
            poll_changes(store.as_ref(), &tags, baseline, interval, &worker_stop, &tx);
        });

        Ok(Self {
            events: rx,
            stop,
            worker: Some(worker),
        })
    }

    /// Next change within `timeout`.
    ///
    /// `Err(Timeout)` means nothing changed yet; `Err(Disconnected)` means the
    /// polling thread has stopped and no further changes will arrive.
    pub(crate) fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Result<TagChange, StoreError>, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("tag subscription worker panicked");
        }
    }
}

fn poll_changes(
    store: &dyn TagStore,
    tags: &[TagData],
    mut last: Vec<Option<ReadResult>>,
    interval: Duration,
    stop: &CancelToken,
    events: &Sender<Result<TagChange, StoreError>>,
) {
    while !stop.sleep(interval) {
        for (tag, last) in tags.iter().zip(last.iter_mut()) {
            let event = match store.read(&tag.path) {
                Ok(current) if current == *last => continue,
                Ok(current) => {
                    *last = current.clone();
                    Ok(TagChange {
                        tag: tag.clone(),
                        value: current,
                    })
                }
                Err(e) => Err(e),
            };
            if events.send(event).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tag::memory::MemoryTagStore;
    use crate::tag::{BufferedWriter, DataType, Selection, TagValue};

    const POLL: Duration = Duration::from_millis(5);
    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn reports_changes_after_baseline() {
        let store = Arc::new(MemoryTagStore::new());
        store.seed("p.Export.Setpoint.Fan", TagValue::Double(0.0), Utc::now());
        let tag = TagData::new("p.Export.Setpoint.Fan", DataType::Double);
        let selection = Selection::from_tags(store.clone(), vec![tag.clone()]);
        let subscription = selection.subscribe(POLL).unwrap();

        // baseline is not reported
        assert!(matches!(
            subscription.recv_timeout(Duration::from_millis(30)),
            Err(RecvTimeoutError::Timeout)
        ));

        BufferedWriter::new(store.as_ref(), 1)
            .write(&tag.path, TagValue::Double(3.5))
            .unwrap();

        let change = subscription.recv_timeout(WAIT).unwrap().unwrap();
        assert_eq!(change.tag, tag);
        assert_eq!(change.value.unwrap().value, TagValue::Double(3.5));
    }

    #[test]
    fn first_write_to_empty_tag_is_a_change() {
        let store = Arc::new(MemoryTagStore::new());
        store.seed_empty("p.Flag", DataType::Boolean);
        let tag = TagData::new("p.Flag", DataType::Boolean);
        let subscription =
            Subscription::start(store.clone(), vec![tag.clone()], POLL).unwrap();

        BufferedWriter::new(store.as_ref(), 1)
            .write(&tag.path, TagValue::Bool(true))
            .unwrap();

        let change = subscription.recv_timeout(WAIT).unwrap().unwrap();
        assert_eq!(change.value.unwrap().value, TagValue::Bool(true));
    }

    #[test]
    fn stopped_worker_reports_disconnect() {
        let store = Arc::new(MemoryTagStore::new());
        store.seed("p.Flag", TagValue::Bool(false), Utc::now());
        let tag = TagData::new("p.Flag", DataType::Boolean);
        let subscription = Subscription::start(store.clone(), vec![tag], POLL).unwrap();
        subscription.stop.cancel();
        assert!(matches!(
            subscription.recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn drop_stops_polling() {
        let store = Arc::new(MemoryTagStore::new());
        store.seed_empty("p.Flag", DataType::Boolean);
        let tag = TagData::new("p.Flag", DataType::Boolean);
        let subscription = Subscription::start(store.clone(), vec![tag], POLL).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        drop(subscription);

        let reads = store.reads();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(store.reads(), reads);
    }
}
