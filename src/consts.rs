/// Appended to the machine's minion id to form the tag prefix
pub(crate) const FLEXLOGGER_SUFFIX: &str = ".FlexLogger";

/// Tags written by this tool for FlexLogger to consume
pub(crate) const IMPORT: &str = "Import";
/// Tags FlexLogger publishes
pub(crate) const EXPORT: &str = "Export";
pub(crate) const SETPOINT: &str = "Setpoint";
pub(crate) const SYSTEM: &str = "System";

pub(crate) const IS_TEST_SESSION_RUNNING: &str = "IsTestSessionRunning";
pub(crate) const LAST_TEST_SESSION_START: &str = "LastTestSessionStart";
