//! In-memory tag store used by the test-suite

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{DataType, ReadResult, StoreError, TagData, TagStore, TagValue, TagWrite};

#[derive(Debug, Default)]
struct Inner {
    tags: BTreeMap<String, (DataType, Option<ReadResult>)>,
    writes: Vec<TagWrite>,
    reads: usize,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryTagStore {
    inner: Mutex<Inner>,
}

impl MemoryTagStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create a tag and set its value, bypassing the write log
    pub(crate) fn seed(&self, path: &str, value: TagValue, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        let data_type = value.data_type();
        inner.tags.insert(
            path.to_string(),
            (
                data_type,
                Some(ReadResult {
                    value,
                    timestamp: Some(timestamp),
                }),
            ),
        );
    }

    /// Create a tag without a value
    pub(crate) fn seed_empty(&self, path: &str, data_type: DataType) {
        let mut inner = self.inner.lock().unwrap();
        inner.tags.insert(path.to_string(), (data_type, None));
    }

    pub(crate) fn writes(&self) -> Vec<TagWrite> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.inner.lock().unwrap().tags.keys().cloned().collect()
    }
}

impl TagStore for MemoryTagStore {
    fn open(&self, path: &str, data_type: DataType, create: bool) -> Result<TagData, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.tags.get(path) {
            Some((existing, _)) if *existing != data_type => Err(StoreError::TypeMismatch {
                path: path.to_string(),
                expected: data_type,
                actual: *existing,
            }),
            Some(_) => Ok(TagData::new(path, data_type)),
            None if create => {
                inner.tags.insert(path.to_string(), (data_type, None));
                Ok(TagData::new(path, data_type))
            }
            None => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    fn query(&self, patterns: &[String]) -> Result<Vec<TagData>, StoreError> {
        let compiled: Vec<glob::Pattern> = patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tags
            .iter()
            .filter(|(path, _)| compiled.iter().any(|p| p.matches(path)))
            .map(|(path, (data_type, _))| TagData::new(path.clone(), *data_type))
            .collect())
    }

    fn read(&self, path: &str) -> Result<Option<ReadResult>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        Ok(inner.tags.get(path).and_then(|(_, value)| value.clone()))
    }

    fn write_batch(&self, writes: &[TagWrite]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for write in writes {
            let data_type = write.value.data_type();
            match inner.tags.get(&write.path) {
                Some((existing, _)) if *existing != data_type => {
                    return Err(StoreError::TypeMismatch {
                        path: write.path.clone(),
                        expected: data_type,
                        actual: *existing,
                    });
                }
                _ => {}
            }
            inner.tags.insert(
                write.path.clone(),
                (
                    data_type,
                    Some(ReadResult {
                        value: write.value.clone(),
                        timestamp: Some(write.timestamp),
                    }),
                ),
            );
            inner.writes.push(write.clone());
        }
        Ok(())
    }
}
