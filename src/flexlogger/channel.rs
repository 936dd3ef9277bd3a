use crate::tag::{DataType, StoreError, TagData, TagStore};

use super::TagPrefix;

/// Make sure a FlexLogger output channel exists and return its export tag.
///
/// FlexLogger turns `Import.Setpoint.<group>.<name>` into an output channel
/// and publishes it as `Export.Setpoint.<name>`. The export tag is created up
/// front too, so reading it never fails just because FlexLogger has not caught
/// up yet. Both creates are idempotent; if the second one fails the first is
/// left in place and the call can simply be repeated.
pub(crate) fn provision_output_channel(
    store: &dyn TagStore,
    prefix: &TagPrefix,
    group: &str,
    name: &str,
    data_type: DataType,
) -> Result<TagData, StoreError> {
    store.open(&prefix.import_setpoint(group, name), data_type, true)?;
    store.open(&prefix.export_setpoint(name), data_type, true)
}

/// Make sure a FlexLogger input channel (`Import.<group>.<name>`) exists
pub(crate) fn create_input_channel(
    store: &dyn TagStore,
    prefix: &TagPrefix,
    group: &str,
    name: &str,
    data_type: DataType,
) -> Result<TagData, StoreError> {
    store.open(&prefix.import_channel(group, name), data_type, true)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tag::TagValue;
    use crate::tag::memory::MemoryTagStore;

    #[test]
    fn provisions_import_and_export_tags() {
        let store = MemoryTagStore::new();
        let prefix = TagPrefix::from_minion_id("m");
        let handle =
            provision_output_channel(&store, &prefix, "Fans", "Speed", DataType::Double).unwrap();

        assert_eq!(handle.path, "m.FlexLogger.Export.Setpoint.Speed");
        assert_eq!(handle.data_type, DataType::Double);
        assert_eq!(
            store.paths(),
            [
                "m.FlexLogger.Export.Setpoint.Speed",
                "m.FlexLogger.Import.Setpoint.Fans.Speed"
            ]
        );
    }

    #[test]
    fn provisioning_twice_is_idempotent() {
        let store = MemoryTagStore::new();
        let prefix = TagPrefix::from_minion_id("m");
        let first =
            provision_output_channel(&store, &prefix, "Fans", "Speed", DataType::Double).unwrap();
        let second =
            provision_output_channel(&store, &prefix, "Fans", "Speed", DataType::Double).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.paths().len(), 2);
    }

    #[test]
    fn provisioning_keeps_existing_values() {
        let store = MemoryTagStore::new();
        let prefix = TagPrefix::from_minion_id("m");
        store.seed(
            &prefix.export_setpoint("Speed"),
            TagValue::Double(12.0),
            Utc::now(),
        );
        provision_output_channel(&store, &prefix, "Fans", "Speed", DataType::Double).unwrap();
        let current = store.read(&prefix.export_setpoint("Speed")).unwrap().unwrap();
        assert_eq!(current.value, TagValue::Double(12.0));
    }

    #[test]
    fn export_type_conflict_leaves_import_in_place() {
        let store = MemoryTagStore::new();
        let prefix = TagPrefix::from_minion_id("m");
        store.seed(
            &prefix.export_setpoint("Speed"),
            TagValue::Bool(false),
            Utc::now(),
        );
        let err = provision_output_channel(&store, &prefix, "Fans", "Speed", DataType::Double)
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert!(store.paths().contains(&prefix.import_setpoint("Fans", "Speed")));
    }

    #[test]
    fn input_channel_path() {
        let store = MemoryTagStore::new();
        let prefix = TagPrefix::from_minion_id("");
        let tag = create_input_channel(
            &store,
            &prefix,
            "Temperature Chamber",
            "Floor",
            DataType::Double,
        )
        .unwrap();
        assert_eq!(tag.path, ".FlexLogger.Import.Temperature Chamber.Floor");
    }
}
