//! Logging for pipeline runs.
//!
//! Messages go to the console (warnings and errors on stderr, everything else on stdout) and,
//! for the `run` command, to a log file in the output folder. Each record is tagged with the
//! pipeline stage (module) that emitted it, e.g. `cost::normalise` or `optimisation`.
use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither the environment nor the settings file gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which takes precedence over the settings file
const LOG_LEVEL_ENV_VAR: &str = "POWERPLAN_LOG_LEVEL";

/// Name of the log file written to the output folder
pub const RUN_LOG_FILE_NAME: &str = "powerplan.log";

/// Prefix stripped from record targets to leave the pipeline stage
const CRATE_TARGET_PREFIX: &str = "powerplan::";

/// Whether [`init`] has completed successfully
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Parse a log level name (`off`, `error`, `warn`, `info`, `debug` or `trace`), ignoring case
pub fn parse_log_level(name: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(name.trim()).ok().with_context(|| {
        format!("Unknown log level: {name} (expected off, error, warn, info, debug or trace)")
    })
}

/// Pick the log level from the environment variable, then the settings file, then the default
fn resolve_log_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    match (from_env, from_settings) {
        (Some(level), _) => parse_log_level(level)
            .with_context(|| format!("Invalid value for {LOG_LEVEL_ENV_VAR}")),
        (None, Some(level)) => parse_log_level(level),
        (None, None) => parse_log_level(DEFAULT_LOG_LEVEL),
    }
}

/// Start logging for this process.
///
/// Can only be called once per process.
///
/// # Arguments
///
/// * `log_level_from_settings` - The `log_level` from `settings.toml`, if any
/// * `output_dir` - Where to write [`RUN_LOG_FILE_NAME`]; no log file is written if `None`
pub fn init(log_level_from_settings: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    let from_env = std::env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = resolve_log_level(from_env.as_deref(), log_level_from_settings)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let mut dispatch = Dispatch::new()
        .chain(console(level, colours, false))
        .chain(console(level, colours, true));

    if let Some(output_dir) = output_dir {
        let path = output_dir.join(RUN_LOG_FILE_NAME);
        let file = File::create(&path)
            .with_context(|| format!("Could not create log file: {}", path.display()))?;

        // The log file always gets a record of the run, even if the console is quieter
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(|out, message, record| format_record(out, record.level(), message, record))
                .level(level.max(LevelFilter::Info))
                .chain(file),
        );
    }

    dispatch.apply().context("Logger already initialised")?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// Console output: warnings and errors go to stderr, other messages to stdout
fn console(level: LevelFilter, colours: ColoredLevelConfig, problems: bool) -> Dispatch {
    let use_colour = if problems {
        std::io::stderr().is_terminal()
    } else {
        std::io::stdout().is_terminal()
    };

    let dispatch = Dispatch::new()
        .filter(move |metadata| (metadata.level() <= LevelFilter::Warn) == problems)
        .format(move |out, message, record| {
            if use_colour {
                format_record(out, colours.color(record.level()), message, record);
            } else {
                format_record(out, record.level(), message, record);
            }
        })
        .level(level);

    if problems {
        dispatch.chain(std::io::stderr())
    } else {
        dispatch.chain(std::io::stdout())
    }
}

/// The pipeline stage a record came from
fn stage(target: &str) -> &str {
    target.strip_prefix(CRATE_TARGET_PREFIX).unwrap_or(target)
}

fn format_record<L: Display>(out: FormatCallback, level: L, message: &Arguments, record: &Record) {
    let timestamp = Local::now().format("%H:%M:%S");
    let stage = stage(record.target());
    out.finish(format_args!("[{timestamp} {level} {stage}] {message}"));
}
