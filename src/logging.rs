use std::fs;

use time::UtcOffset;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{reload::Handle, EnvFilter};

/// First line holds the filter directives, e.g. `info,fve_payback=debug`.
const LOGGING_ENV_FILE: &str = "logging.env";

pub fn init_logging() -> Result<LoggingHandle<EnvFilter, impl Subscriber>, String> {
    init_tracing_logger()
}

#[derive(Debug)]
pub enum ReloadLogLevelError {
    InvalidFilter(String),
    ReloadFailed(tracing_subscriber::reload::Error),
}

impl std::fmt::Display for ReloadLogLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadLogLevelError::InvalidFilter(e) => write!(f, "Invalid filter: {}", e),
            ReloadLogLevelError::ReloadFailed(e) => write!(f, "Reload failed: {}", e),
        }
    }
}

pub fn reload_log_level(
    logging_handle: &LoggingHandle<EnvFilter, impl Subscriber>,
) -> Result<String, ReloadLogLevelError> {
    let new_filter = read_env_filter().map_err(ReloadLogLevelError::InvalidFilter)?;

    let filter_string = format!("{}", new_filter);

    logging_handle
        .handle
        .reload(new_filter)
        .map_err(ReloadLogLevelError::ReloadFailed)?;

    Ok(filter_string)
}

fn init_tracing_logger() -> Result<LoggingHandle<EnvFilter, impl Subscriber>, String> {
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or_else(|err| {
            eprintln!("Failed to get timezone: {}", err);
            UtcOffset::UTC
        }),
        time::macros::format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] +[offset_hour]"
        ),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let env_filter = read_env_filter().unwrap_or_else(|err| {
        eprintln!(
            "Failed to read env filter, using environment variable or default: {}",
            err
        );
        EnvFilter::builder()
            .with_default_directive(Level::DEBUG.into())
            .from_env_lossy()
    });

    let filter_string = env_filter.to_string();

    let builder = tracing_subscriber::fmt()
        .with_timer(timer)
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_filter_reloading();

    let handle = builder.reload_handle();

    tracing::subscriber::set_global_default(builder.finish())
        .map_err(|err| format!("failed to initialize logger: {}", err))?;

    // Call sites use the log facade.
    tracing_log::LogTracer::init().map_err(|err| format!("failed to bridge log records: {}", err))?;
    log::debug!("Env Filter: {}", filter_string);

    Ok(LoggingHandle {
        _non_blocking_guard: guard,
        handle,
    })
}

fn read_env_filter() -> Result<EnvFilter, String> {
    let s = fs::read_to_string(LOGGING_ENV_FILE)
        .map_err(|err| format!("Failed to read file {} file: {}", LOGGING_ENV_FILE, err))?;
    let first_line = s
        .lines()
        .next()
        .ok_or_else(|| format!("{} is empty", LOGGING_ENV_FILE))?;
    EnvFilter::builder()
        .with_default_directive(tracing::Level::DEBUG.into())
        .parse(first_line)
        .map_err(|err| format!("Failed to parse env filter: {}", err))
}

pub struct LoggingHandle<L, S> {
    // Flushes buffered lines when dropped.
    _non_blocking_guard: WorkerGuard,
    handle: Handle<L, S>,
}
