use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use chrono::Utc;

use crate::cli::{Cli, Commands};
use crate::error::AppError;
use crate::flexlogger::{
    SessionSynchronizer, StartOutcome, TagPrefix, TempChamber, collect_tag_rows,
    provision_output_channel,
};
use crate::output::{TagTableOptions, format_read, output_tags_json, print_tag_table};
use crate::tag::{
    BufferedWriter, Connection, DataType, HttpTagStore, Locality, Selection, TagData, TagStore,
    TagValue,
};
use crate::utils::{CancelToken, PollSchedule, Timezone, install_interrupt_handler};

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_SIMULATE_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const OUTPUT_WRITER_BUFFER_SIZE: usize = 10;

const NO_CHANNELS: &str = "No channels reported to NI SystemLink; check your project settings";

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) prefix: TagPrefix,
    pub(crate) store: Arc<dyn TagStore>,
}

/// Resolve the prefix and connection, then run the selected command
pub(crate) fn run(cli: &Cli) -> Result<(), AppError> {
    let prefix = match &cli.minion_id_file {
        Some(path) => TagPrefix::from_file(path)?,
        None => TagPrefix::resolve()?,
    };
    tracing::debug!(%prefix, "resolved tag prefix");

    let connection = Connection::resolve(&cli.connection_settings(), Locality::LocalOnly)?;
    let ctx = CommandContext {
        cli,
        prefix,
        store: Arc::new(HttpTagStore::connect(&connection)),
    };

    match &cli.command {
        Commands::CreateOutputChannel {
            group,
            name,
            value,
            watch_interval,
        } => {
            let interval = millis_or(*watch_interval, DEFAULT_WATCH_INTERVAL);
            handle_create_output_channel(&ctx, group, name, *value, interval)
        }
        Commands::SimulateTempChamber { interval } => {
            handle_simulate_temp_chamber(&ctx, millis_or(*interval, DEFAULT_SIMULATE_INTERVAL))
        }
        Commands::ListAllTags {
            prefix,
            json,
            timezone,
        } => {
            let timezone = Timezone::parse(timezone.as_deref())?;
            handle_list_all_tags(&ctx, prefix.as_deref().unwrap_or(""), *json, timezone)
        }
        Commands::StartStop {
            timeout,
            poll_interval,
        } => {
            let schedule = PollSchedule::new(
                millis_or(*poll_interval, DEFAULT_POLL_INTERVAL),
                timeout.map(Duration::from_secs),
            );
            handle_start_stop(&ctx, schedule)
        }
    }
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, Duration::from_millis)
}

fn handle_create_output_channel(
    ctx: &CommandContext<'_>,
    group: &str,
    name: &str,
    value: f64,
    interval: Duration,
) -> Result<(), AppError> {
    let cancel = install_interrupt_handler()?;
    let store = ctx.store.as_ref();
    let channel = provision_output_channel(store, &ctx.prefix, group, name, DataType::Double)?;

    println!("Created output channel; watching for updates");
    println!(" * Hit Ctrl-C to exit");
    println!();

    let initial = store.read(&channel.path)?;
    println!("Initial value is {}", format_read(initial.as_ref()));

    // FlexLogger resets the value to 0 once it has created the channel, so
    // this write may be short-lived.
    println!("Changing value to {value}");
    let mut writer = BufferedWriter::new(store, OUTPUT_WRITER_BUFFER_SIZE);
    writer.write(&channel.path, TagValue::Double(value))?;
    writer.send_buffered_writes()?;
    drop(writer);

    watch_for_changes(Arc::clone(&ctx.store), vec![channel], interval, &cancel)
}

/// Print every value change of `tags` until cancelled
fn watch_for_changes(
    store: Arc<dyn TagStore>,
    tags: Vec<TagData>,
    interval: Duration,
    cancel: &CancelToken,
) -> Result<(), AppError> {
    let selection = Selection::from_tags(store, tags);
    let subscription = selection.subscribe(interval)?;
    tracing::debug!(tags = selection.tags().len(), ?interval, "watching for changes");
    while !cancel.is_cancelled() {
        match subscription.recv_timeout(interval) {
            Ok(Ok(change)) => {
                tracing::debug!(path = %change.tag.path, "tag changed");
                println!("Value changed to {}", format_read(change.value.as_ref()));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("tag subscription ended");
                break;
            }
        }
    }
    Ok(())
}

fn handle_simulate_temp_chamber(
    ctx: &CommandContext<'_>,
    interval: Duration,
) -> Result<(), AppError> {
    let cancel = install_interrupt_handler()?;
    let store = ctx.store.as_ref();
    let mut chamber = TempChamber::create(store, &ctx.prefix)?;
    for channel in chamber.channels() {
        tracing::debug!(path = %channel.path, "input channel ready");
    }

    println!("Starting simulation; hit Ctrl-C to stop");
    let samples = chamber.run(store, interval, &cancel)?;
    tracing::info!(samples, values = ?chamber.values(), "simulation stopped");
    Ok(())
}

fn handle_list_all_tags(
    ctx: &CommandContext<'_>,
    sub_prefix: &str,
    json: bool,
    timezone: Timezone,
) -> Result<(), AppError> {
    let rows = collect_tag_rows(Arc::clone(&ctx.store), &ctx.prefix, sub_prefix)?;
    if rows.is_empty() {
        println!("{NO_CHANNELS}");
        return Ok(());
    }
    if json {
        println!("{}", output_tags_json(&rows, timezone));
    } else {
        print_tag_table(
            &rows,
            TagTableOptions {
                use_color: ctx.cli.use_color(),
                timezone,
            },
        );
    }
    Ok(())
}

fn handle_start_stop(ctx: &CommandContext<'_>, schedule: PollSchedule) -> Result<(), AppError> {
    let cancel = install_interrupt_handler()?;
    let mut session = SessionSynchronizer::new(ctx.store.as_ref(), &ctx.prefix, schedule);

    let reference = Utc::now();
    session.start()?;
    println!("Sent start request; waiting for acknowledgement");

    match session.await_start(reference, &cancel)? {
        StartOutcome::Started { started_at } => {
            tracing::info!(%started_at, "test session running");
            println!("Test started; press Ctrl-C to stop it");
            cancel.wait();
        }
        StartOutcome::Cancelled => {
            tracing::info!("interrupted before FlexLogger acknowledged the session");
        }
        StartOutcome::TimedOut => {
            // withdraw the request so FlexLogger does not start later on its own
            session.stop()?;
            return Err(AppError::StartTimedOut {
                waited: schedule.timeout.unwrap_or_default(),
            });
        }
    }

    println!("Stopping test session");
    session.stop()?;
    tracing::debug!(state = ?session.state(), "stop requested");
    Ok(())
}
