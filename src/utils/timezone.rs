use chrono::{DateTime, Local, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::AppError;

/// Timezone used when printing tag timestamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Timezone {
    Utc,
    Local,
    Named(Tz),
}

impl Timezone {
    /// Timestamps are shown in UTC unless asked otherwise
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = value else {
            return Ok(Timezone::Utc);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("utc")
            || trimmed.eq_ignore_ascii_case("z")
        {
            return Ok(Timezone::Utc);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        Tz::from_str(trimmed)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: trimmed.to_string(),
            })
    }

    pub(crate) fn format(self, ts: DateTime<Utc>) -> String {
        match self {
            Timezone::Utc => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            Timezone::Local => ts
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            Timezone::Named(tz) => ts
                .with_timezone(&tz)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
        }
    }
}
