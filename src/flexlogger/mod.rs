//! FlexLogger conventions layered on the tag client

pub(crate) mod channel;
pub(crate) mod listing;
pub(crate) mod prefix;
pub(crate) mod session;
pub(crate) mod simulate;

pub(crate) use channel::{create_input_channel, provision_output_channel};
pub(crate) use listing::{TagRow, collect_tag_rows};
pub(crate) use prefix::TagPrefix;
pub(crate) use session::{SessionSynchronizer, StartOutcome};
pub(crate) use simulate::TempChamber;
