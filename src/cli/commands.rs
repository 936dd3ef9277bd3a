//! CLI subcommand definitions

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Create a FlexLogger output channel and watch for value changes made in FlexLogger
    CreateOutputChannel {
        /// Channel group shown in FlexLogger
        group: String,
        /// Channel name
        name: String,
        /// Value written once the channel exists
        #[arg(long, default_value_t = 2.0)]
        value: f64,
        /// How often to check the channel for changes, in milliseconds
        #[arg(long, value_name = "MS")]
        watch_interval: Option<u64>,
    },
    /// Write simulated temperature chamber data to FlexLogger input channels
    SimulateTempChamber {
        /// Time between samples, in milliseconds
        #[arg(long, value_name = "MS")]
        interval: Option<u64>,
    },
    /// List the FlexLogger tags on this machine
    ListAllTags {
        /// Only list tags under this sub-prefix (e.g. "Export.")
        prefix: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
        /// Timezone for timestamps (e.g. "UTC", "local", "America/Chicago")
        #[arg(long, value_name = "TZ")]
        timezone: Option<String>,
    },
    /// Start a FlexLogger test session and stop it on Ctrl-C
    StartStop {
        /// Give up waiting for FlexLogger after this many seconds (default: wait forever)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// How often to poll the session tags, in milliseconds
        #[arg(long, value_name = "MS")]
        poll_interval: Option<u64>,
    },
}
