use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;

use super::{ReadResult, StoreError, Subscription, TagData, TagStore};

/// A fixed set of tags that can be read together or watched for changes
pub(crate) struct Selection {
    store: Arc<dyn TagStore>,
    tags: Vec<TagData>,
}

impl Selection {
    /// Resolve glob-style path patterns to the tags that exist right now
    pub(crate) fn open(store: Arc<dyn TagStore>, patterns: &[String]) -> Result<Self, StoreError> {
        let mut tags = store.query(patterns)?;
        tags.sort_by(|a, b| a.path.cmp(&b.path));
        tags.dedup_by(|a, b| a.path == b.path);
        tracing::debug!(?patterns, matched = tags.len(), "opened tag selection");
        Ok(Self { store, tags })
    }

    pub(crate) fn from_tags(store: Arc<dyn TagStore>, tags: Vec<TagData>) -> Self {
        Self { store, tags }
    }

    pub(crate) fn tags(&self) -> &[TagData] {
        &self.tags
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Read every tag in the selection. Results keep the selection's order.
    pub(crate) fn read_all(&self) -> Result<Vec<(TagData, Option<ReadResult>)>, StoreError> {
        self.tags
            .par_iter()
            .map(|tag| {
                let value = self.store.read(&tag.path)?;
                Ok((tag.clone(), value))
            })
            .collect()
    }

    /// Start watching the selection for value changes
    pub(crate) fn subscribe(&self, interval: Duration) -> Result<Subscription, StoreError> {
        Subscription::start(Arc::clone(&self.store), self.tags.clone(), interval)
    }
}
