use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::tag::{ConnectionError, StoreError};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("There is already a test session running")]
    AlreadyRunning,

    #[error("FlexLogger did not acknowledge the test session within {}s", waited.as_secs())]
    StartTimedOut { waited: Duration },

    #[error("Failed to read minion id from {}: {source}", path.display())]
    MinionId {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Failed to install Ctrl-C handler: {0}")]
    Interrupt(#[from] ctrlc::Error),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
