use chrono::{DateTime, Utc};

use super::{StoreError, TagStore, TagValue, TagWrite};

/// Collects value updates and sends them to the store in batches.
///
/// A batch goes out when `buffer_size` updates are pending or when
/// [`send_buffered_writes`](Self::send_buffered_writes) is called. Whatever is
/// still pending when the writer is dropped is sent then.
pub(crate) struct BufferedWriter<'a> {
    store: &'a dyn TagStore,
    buffer_size: usize,
    pending: Vec<TagWrite>,
}

impl<'a> BufferedWriter<'a> {
    pub(crate) fn new(store: &'a dyn TagStore, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            store,
            buffer_size,
            pending: Vec::with_capacity(buffer_size),
        }
    }

    /// Queue a value stamped with the current time
    pub(crate) fn write(&mut self, path: &str, value: TagValue) -> Result<(), StoreError> {
        self.write_at(path, value, Utc::now())
    }

    pub(crate) fn write_at(
        &mut self,
        path: &str,
        value: TagValue,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.pending.push(TagWrite {
            path: path.to_string(),
            value,
            timestamp,
        });
        if self.pending.len() >= self.buffer_size {
            self.send_buffered_writes()?;
        }
        Ok(())
    }

    pub(crate) fn send_buffered_writes(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        tracing::debug!(count = batch.len(), "sending buffered tag writes");
        self.store.write_batch(&batch)
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for BufferedWriter<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.send_buffered_writes() {
            tracing::warn!(error = %e, "dropping unsent tag writes");
        }
    }
}
