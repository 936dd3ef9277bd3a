//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode};
use crate::tag::ConnectionSettings;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Debug, Parser)]
#[command(name = "flexlogger-tags")]
#[command(
    about = "Exchange FlexLogger channel values through the local SystemLink tag service",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Tag service URL (default: the SystemLink localhost configuration)
    #[arg(long, global = true, value_name = "URL")]
    pub(crate) server_url: Option<String>,

    /// API key sent to the tag service
    #[arg(long, global = true, value_name = "KEY")]
    pub(crate) api_key: Option<String>,

    /// SystemLink HTTP configuration file to read the server URL from
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) http_configuration: Option<PathBuf>,

    /// Read the machine's minion id from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) minion_id_file: Option<PathBuf>,

    /// Timeout for each request to the tag service, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub(crate) request_timeout: Option<u64>,

    /// Config file to use instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.no_color && config.no_color {
            self.no_color = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }

        if let Some(color) = config.color
            && self.color == ColorMode::Auto
        {
            self.color = match color {
                ConfigColorMode::Auto => ColorMode::Auto,
                ConfigColorMode::Always => ColorMode::Always,
                ConfigColorMode::Never => ColorMode::Never,
            };
        }

        // String and numeric options: only apply if CLI didn't set them
        fill(&mut self.server_url, &config.server_url);
        fill(&mut self.api_key, &config.api_key);
        fill(&mut self.http_configuration, &config.http_configuration);
        fill(&mut self.minion_id_file, &config.minion_id_file);
        fill(&mut self.request_timeout, &config.request_timeout_secs);

        match &mut self.command {
            Commands::CreateOutputChannel { watch_interval, .. } => {
                fill(watch_interval, &config.watch_interval_ms);
            }
            Commands::SimulateTempChamber { interval } => {
                fill(interval, &config.simulate_interval_ms);
            }
            Commands::ListAllTags { timezone, .. } => {
                fill(timezone, &config.timezone);
            }
            Commands::StartStop {
                timeout,
                poll_interval,
            } => {
                fill(timeout, &config.start_timeout_secs);
                fill(poll_interval, &config.poll_interval_ms);
            }
        }

        self
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    pub(crate) fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            server_url: self.server_url.clone(),
            api_key: self.api_key.clone(),
            http_configuration: self.http_configuration.clone(),
            request_timeout: self.request_timeout.map(Duration::from_secs),
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}
