//! Machine-local tag namespace
//!
//! FlexLogger publishes its tags under `<minion id>.FlexLogger`, where the
//! minion id is the SystemLink (Salt) identity of the machine. Machines that
//! were never registered have no minion id and use `.FlexLogger`.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use crate::consts::{EXPORT, FLEXLOGGER_SUFFIX, IMPORT, SETPOINT, SYSTEM};
use crate::error::AppError;
use crate::utils::paths::minion_id_path;

static RESOLVED: OnceLock<TagPrefix> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TagPrefix(String);

impl TagPrefix {
    /// Resolve the prefix for this machine once per process.
    ///
    /// A read failure is not cached, so a later call tries again.
    pub(crate) fn resolve() -> Result<Self, AppError> {
        if let Some(prefix) = RESOLVED.get() {
            return Ok(prefix.clone());
        }
        let prefix = Self::from_file(&minion_id_path())?;
        Ok(RESOLVED.get_or_init(|| prefix).clone())
    }

    /// Build the prefix from a minion id file without touching the cache
    pub(crate) fn from_file(path: &Path) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "read minion id");
                Ok(Self::from_minion_id(content.trim()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::from_minion_id("")),
            Err(source) => Err(AppError::MinionId {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub(crate) fn from_minion_id(minion_id: &str) -> Self {
        Self(format!("{minion_id}{FLEXLOGGER_SUFFIX}"))
    }

    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut path = self.0.clone();
        for segment in segments {
            path.push('.');
            path.push_str(segment);
        }
        path
    }

    /// Output channel as requested by this process
    pub(crate) fn import_setpoint(&self, group: &str, name: &str) -> String {
        self.join(&[IMPORT, SETPOINT, group, name])
    }

    /// Output channel once FlexLogger has picked it up
    pub(crate) fn export_setpoint(&self, name: &str) -> String {
        self.join(&[EXPORT, SETPOINT, name])
    }

    /// Input channel fed by this process
    pub(crate) fn import_channel(&self, group: &str, name: &str) -> String {
        self.join(&[IMPORT, group, name])
    }

    /// FlexLogger system tag such as `IsTestSessionRunning`
    pub(crate) fn system(&self, name: &str) -> String {
        self.join(&[EXPORT, SYSTEM, name])
    }

    /// `<prefix>.<sub_prefix>`, the text every listed tag path starts with
    pub(crate) fn scoped(&self, sub_prefix: &str) -> String {
        format!("{}.{sub_prefix}", self.0)
    }
}

impl fmt::Display for TagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_minion_id_file_prefix_is_suffix_only() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = TagPrefix::from_file(&dir.path().join("minion_id")).unwrap();
        assert_eq!(prefix.as_str(), ".FlexLogger");
    }

    #[test]
    fn minion_id_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minion_id");
        std::fs::write(&path, "  minion-123\n").unwrap();
        let prefix = TagPrefix::from_file(&path).unwrap();
        assert_eq!(prefix.as_str(), "minion-123.FlexLogger");
    }

    #[test]
    fn unreadable_minion_id_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let err = TagPrefix::from_file(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::MinionId { .. }));
    }

    #[test]
    fn resolve_is_idempotent() {
        let first = TagPrefix::resolve().unwrap();
        let second = TagPrefix::resolve().unwrap();
        assert_eq!(first, second);
        assert!(first.as_str().ends_with(".FlexLogger"));
    }

    #[test]
    fn path_helpers() {
        let prefix = TagPrefix::from_minion_id("rig-7");
        assert_eq!(
            prefix.import_setpoint("Fans", "Speed"),
            "rig-7.FlexLogger.Import.Setpoint.Fans.Speed"
        );
        assert_eq!(
            prefix.export_setpoint("Speed"),
            "rig-7.FlexLogger.Export.Setpoint.Speed"
        );
        assert_eq!(
            prefix.import_channel("Temperature Chamber", "Door"),
            "rig-7.FlexLogger.Import.Temperature Chamber.Door"
        );
        assert_eq!(
            prefix.system("IsTestSessionRunning"),
            "rig-7.FlexLogger.Export.System.IsTestSessionRunning"
        );
        assert_eq!(prefix.scoped(""), "rig-7.FlexLogger.");
        assert_eq!(prefix.scoped("Export."), "rig-7.FlexLogger.Export.");
    }
}
