use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::tag::{DataType, Selection, StoreError, TagStore, TagValue};

use super::TagPrefix;

/// One line of the tag listing
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagRow {
    /// Tag path with the listing prefix removed
    pub(crate) name: String,
    /// `None` for tags that have never been written
    pub(crate) data_type: Option<DataType>,
    pub(crate) value: Option<TagValue>,
    pub(crate) timestamp: Option<DateTime<Utc>>,
}

/// Read every tag under `<prefix>.<sub_prefix>`, sorted case-insensitively by name
pub(crate) fn collect_tag_rows(
    store: Arc<dyn TagStore>,
    prefix: &TagPrefix,
    sub_prefix: &str,
) -> Result<Vec<TagRow>, StoreError> {
    let scope = prefix.scoped(sub_prefix);
    let selection = Selection::open(store, &[format!("{scope}*")])?;
    if selection.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows: Vec<TagRow> = selection
        .read_all()?
        .into_iter()
        .map(|(tag, read)| {
            let name = tag
                .path
                .strip_prefix(scope.as_str())
                .unwrap_or(&tag.path)
                .to_string();
            match read {
                Some(read) => TagRow {
                    name,
                    data_type: Some(read.data_type()),
                    value: Some(read.value),
                    timestamp: read.timestamp,
                },
                None => TagRow {
                    name,
                    data_type: None,
                    value: None,
                    timestamp: None,
                },
            }
        })
        .collect();
    rows.sort_by_cached_key(|row| row.name.to_lowercase());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::memory::MemoryTagStore;

    fn store() -> Arc<MemoryTagStore> {
        let store = Arc::new(MemoryTagStore::new());
        let now = Utc::now();
        store.seed("m.FlexLogger.Export.zeta", TagValue::Double(1.0), now);
        store.seed("m.FlexLogger.Export.Alpha", TagValue::Double(2.0), now);
        store.seed("m.FlexLogger.Export.beta", TagValue::Bool(true), now);
        store.seed_empty("m.FlexLogger.Import.Gamma", DataType::Double);
        store.seed("n.FlexLogger.Export.Other", TagValue::Double(3.0), now);
        store
    }

    #[test]
    fn rows_are_sorted_case_insensitively_with_prefix_stripped() {
        let rows = collect_tag_rows(store(), &TagPrefix::from_minion_id("m"), "").unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["Export.Alpha", "Export.beta", "Export.zeta", "Import.Gamma"]
        );
    }

    #[test]
    fn sub_prefix_narrows_and_is_stripped() {
        let rows =
            collect_tag_rows(store(), &TagPrefix::from_minion_id("m"), "Export.").unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", "zeta"]);
        assert_eq!(rows[1].data_type, Some(DataType::Boolean));
        assert_eq!(rows[1].value, Some(TagValue::Bool(true)));
    }

    #[test]
    fn unwritten_tags_have_no_type_or_value() {
        let rows =
            collect_tag_rows(store(), &TagPrefix::from_minion_id("m"), "Import.").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data_type, None);
        assert_eq!(rows[0].value, None);
        assert_eq!(rows[0].timestamp, None);
    }

    #[test]
    fn nothing_under_prefix_is_empty() {
        let store = store();
        let reads = store.reads();
        let rows = collect_tag_rows(store.clone(), &TagPrefix::from_minion_id("x"), "").unwrap();
        assert!(rows.is_empty());
        assert_eq!(store.reads(), reads);
    }
}
