pub(crate) mod interrupt;
pub(crate) mod paths;
pub(crate) mod timezone;
pub(crate) mod wait;

pub(crate) use interrupt::install_interrupt_handler;
pub(crate) use timezone::Timezone;
pub(crate) use wait::{CancelToken, PollSchedule, WaitOutcome, poll_until};
