//! Starting and stopping a FlexLogger test session
//!
//! A session is requested by writing `true` to `IsTestSessionRunning`.
//! FlexLogger acknowledges by updating `LastTestSessionStart` and then
//! reporting `IsTestSessionRunning = true`. Depending on the FlexLogger
//! version the two tags share a timestamp or the flag is written second, so
//! the flag only counts once its timestamp is no older than the confirmed
//! start. That rules out a stale `true` left over from an earlier session.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::consts::{IS_TEST_SESSION_RUNNING, LAST_TEST_SESSION_START};
use crate::error::AppError;
use crate::tag::{BufferedWriter, DataType, ReadResult, StoreError, TagStore, TagValue};
use crate::utils::{CancelToken, PollSchedule, WaitOutcome, poll_until};

use super::TagPrefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StartOutcome {
    Started { started_at: DateTime<Utc> },
    TimedOut,
    Cancelled,
}

pub(crate) struct SessionSynchronizer<'a> {
    store: &'a dyn TagStore,
    running_path: String,
    last_start_path: String,
    schedule: PollSchedule,
    state: SessionState,
}

impl<'a> SessionSynchronizer<'a> {
    pub(crate) fn new(store: &'a dyn TagStore, prefix: &TagPrefix, schedule: PollSchedule) -> Self {
        Self {
            store,
            running_path: prefix.system(IS_TEST_SESSION_RUNNING),
            last_start_path: prefix.system(LAST_TEST_SESSION_START),
            schedule,
            state: SessionState::Idle,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "test session state");
        self.state = next;
    }

    /// Ask FlexLogger to start a test session
    pub(crate) fn start(&mut self) -> Result<(), AppError> {
        if let Some(ReadResult {
            value: TagValue::Bool(true),
            ..
        }) = self.store.read(&self.running_path)?
        {
            return Err(AppError::AlreadyRunning);
        }
        let mut writer = BufferedWriter::new(self.store, 1);
        writer.write(&self.running_path, TagValue::Bool(true))?;
        self.transition(SessionState::Starting);
        Ok(())
    }

    /// Wait until FlexLogger reports a session that started after `reference`.
    ///
    /// The configured timeout covers both phases together.
    pub(crate) fn await_start(
        &mut self,
        reference: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<StartOutcome, StoreError> {
        let began = Instant::now();
        let started_at = match poll_until(cancel, self.schedule, || self.started_after(reference))? {
            WaitOutcome::Ready(started_at) => started_at,
            WaitOutcome::TimedOut => return Ok(StartOutcome::TimedOut),
            WaitOutcome::Cancelled => return Ok(StartOutcome::Cancelled),
        };
        tracing::debug!(%started_at, "FlexLogger recorded a new session start");

        let remaining = self
            .schedule
            .timeout
            .map(|timeout| timeout.saturating_sub(began.elapsed()));
        let schedule = PollSchedule::new(self.schedule.interval, remaining);
        match poll_until(cancel, schedule, || self.running_since(started_at))? {
            WaitOutcome::Ready(()) => {
                self.transition(SessionState::Running);
                Ok(StartOutcome::Started { started_at })
            }
            WaitOutcome::TimedOut => Ok(StartOutcome::TimedOut),
            WaitOutcome::Cancelled => Ok(StartOutcome::Cancelled),
        }
    }

    /// Ask FlexLogger to stop the test session. No acknowledgement is awaited.
    pub(crate) fn stop(&mut self) -> Result<(), StoreError> {
        self.transition(SessionState::Stopping);
        let mut writer = BufferedWriter::new(self.store, 1);
        writer.write(&self.running_path, TagValue::Bool(false))?;
        self.transition(SessionState::Idle);
        Ok(())
    }

    /// Timestamp of the `LastTestSessionStart` reading once its value is past `reference`
    fn started_after(&self, reference: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(read) = self.store.read(&self.last_start_path)? else {
            return Ok(None);
        };
        match read.value {
            TagValue::DateTime(value) if value > reference => Ok(Some(read.timestamp.unwrap_or(value))),
            TagValue::DateTime(_) => Ok(None),
            other => Err(StoreError::TypeMismatch {
                path: self.last_start_path.clone(),
                expected: DataType::DateTime,
                actual: other.data_type(),
            }),
        }
    }

    fn running_since(&self, started_at: DateTime<Utc>) -> Result<Option<()>, StoreError> {
        let Some(read) = self.store.read(&self.running_path)? else {
            return Ok(None);
        };
        match (read.value, read.timestamp) {
            (TagValue::Bool(true), Some(ts)) if ts >= started_at => Ok(Some(())),
            (TagValue::Bool(_), _) => Ok(None),
            (other, _) => Err(StoreError::TypeMismatch {
                path: self.running_path.clone(),
                expected: DataType::Boolean,
                actual: other.data_type(),
            }),
        }
    }
}
