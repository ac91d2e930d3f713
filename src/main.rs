use std::fs;
use std::process::exit;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::*;
use tokio::runtime::{Builder, Runtime};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, HomeAssistantConfig, SinkConfig, SourceConfig};
use crate::evaluator::{Evaluator, EvaluatorError};
use crate::io::home_assistant::HomeAssistantClient;
use crate::io::sinks::console::LogSink;
use crate::io::sinks::file::LiveFileSink;
use crate::io::sinks::home_assistant::HomeAssistantSink;
use crate::io::sinks::Publication;
use crate::io::states::file::LiveFileStates;
use crate::io::states::home_assistant::HomeAssistantStates;
use crate::io::IOBundle;
use crate::logging::LoggingHandle;
use crate::time_util::mytime::{RealTimeProvider, TimeProvider};

mod config;
mod evaluator;
mod io;
mod logging;
mod simulate;
mod time_util;

const CONFIG_FILE: &str = "fve_payback.toml";

fn main() {
    let logging_handle = match logging::init_logging() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            exit(1);
        }
    };

    if let Err(e) = run(&logging_handle) {
        error!("{}", e);
        // Flush buffered log lines before exiting.
        drop(logging_handle);
        exit(1);
    }
}

fn run(logging_handle: &LoggingHandle<EnvFilter, impl Subscriber>) -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--simulate") {
        simulate::simulate();
        return Ok(());
    }

    let config_file = args.get(1).map(String::as_str).unwrap_or(CONFIG_FILE);
    info!("Reading config from {}", config_file);
    let config = read_config(config_file)?;

    let mut evaluator = Evaluator::new();
    evaluator.configure(config.get_metrics()).map_err(|e| e.to_string())?;

    let io_bundle = make_io_bundle(&config).map_err(|e| format!("Failed to set up IO: {}", e))?;

    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .enable_io()
        .build()
        .map_err(|e| format!("Failed to build runtime: {}", e))?;

    main_loop(evaluator, io_bundle, rt, &config, &RealTimeProvider::default(), logging_handle)
}

fn read_config(file: &str) -> Result<Config, String> {
    let config = fs::read_to_string(file)
        .map_err(|e| format!("Unable to read config file {}: {}", file, e))?;
    toml::from_str(&config)
        .map_err(|e| format!("Error reading config file {}: {}", file, e))
}

fn make_io_bundle(config: &Config) -> Result<IOBundle, String> {
    let mut io_bundle = match config.get_source() {
        SourceConfig::HomeAssistant(ha_config) => {
            IOBundle::new(HomeAssistantStates::new(HomeAssistantClient::from_config(ha_config)?))
        }
        SourceConfig::LiveFile { path } => {
            info!("Reading states from {:?}", path);
            IOBundle::new(LiveFileStates::new(path.clone(), *config.get_poll().get_max_state_age()))
        }
    };

    for sink in config.get_output().get_sinks() {
        io_bundle = match sink {
            SinkConfig::Log => io_bundle.with_sink(LogSink::default()),
            SinkConfig::HomeAssistant { url, token } => {
                let ha_config = sink_home_assistant_config(config.get_source(), url, token)?;
                io_bundle.with_sink(HomeAssistantSink::new(HomeAssistantClient::from_config(&ha_config)?))
            }
            SinkConfig::LiveFile { path } => io_bundle.with_sink(LiveFileSink::new(path.clone())),
        };
    }

    Ok(io_bundle)
}

/// Publishing defaults to the Home Assistant instance the states come from.
fn sink_home_assistant_config(
    source: &SourceConfig,
    url: &Option<String>,
    token: &Option<String>,
) -> Result<HomeAssistantConfig, String> {
    match (url, source) {
        (Some(url), _) => Ok(HomeAssistantConfig::new(url.clone(), token.clone())),
        (None, SourceConfig::HomeAssistant(source)) => match token {
            Some(token) => Ok(HomeAssistantConfig::new(source.get_url().to_owned(), Some(token.clone()))),
            None => Ok(source.clone()),
        },
        (None, _) => Err("HomeAssistant sink needs a url when the source is not Home Assistant".to_owned()),
    }
}

/// Reads the states once, refreshes the evaluator and publishes whatever it now holds.
async fn run_cycle(
    evaluator: &mut Evaluator,
    io_bundle: &IOBundle,
    config: &Config,
    time: &impl TimeProvider,
) -> Result<(), EvaluatorError> {
    let keys: Vec<String> = evaluator
        .get_bindings()
        .iter()
        .map(|binding| binding.get_source_key().to_owned())
        .collect();

    match io_bundle.state_source().retrieve_states(&keys).await {
        Ok(snapshot) => {
            debug!("Read {} of {} states", snapshot.len(), keys.len());
            evaluator.refresh(|key| snapshot.sample(key), time)?;
        }
        Err(e) => evaluator.record_failure(e),
    }

    let publication = Publication::from_state(evaluator.get_state(), config.get_output());
    io_bundle.publish(&publication).await;
    Ok(())
}

fn main_loop(
    mut evaluator: Evaluator,
    io_bundle: IOBundle,
    rt: Runtime,
    config: &Config,
    time: &impl TimeProvider,
    logging_handle: &LoggingHandle<EnvFilter, impl Subscriber>,
) -> Result<(), String> {
    let should_exit = Arc::new(AtomicBool::new(false));
    {
        let should_exit = should_exit.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!("Received termination signal.");
            should_exit.store(true, Ordering::Relaxed);
        }) {
            error!("Failed to attach kill handler: {}", e);
        }
    }

    let reload_requested = Arc::new(AtomicBool::new(false));
    spawn_reload_listener(&rt, reload_requested.clone());

    let interval = *config.get_poll().get_interval();
    info!("Beginning main loop, refreshing every {}s.", interval.as_secs());
    let mut i: u64 = 0;
    loop {
        i += 1;
        if i % 6 == 0 {
            info!("Still alive..");
        }
        if should_exit.load(Ordering::Relaxed) {
            info!("Stopping.");
            rt.shutdown_background();
            return Ok(());
        }
        if reload_requested.swap(false, Ordering::Relaxed) {
            match logging::reload_log_level(logging_handle) {
                Ok(filter) => info!("Reloaded log level: {}", filter),
                Err(e) => error!("Failed to reload log level: {}", e),
            }
        }

        let started = Instant::now();
        if let Err(e) = rt.block_on(run_cycle(&mut evaluator, &io_bundle, config, time)) {
            rt.shutdown_background();
            return Err(format!("Evaluator Failure: {}", e));
        }

        wait_for_next_cycle(interval.saturating_sub(started.elapsed()), &should_exit);
    }
}

/// Sleeps for `duration`, waking early if asked to exit.
fn wait_for_next_cycle(duration: Duration, should_exit: &AtomicBool) {
    let step = Duration::from_millis(500);
    let deadline = Instant::now() + duration;
    while !should_exit.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(step.min(deadline - now));
    }
}

#[cfg(unix)]
fn spawn_reload_listener(rt: &Runtime, reload_requested: Arc<AtomicBool>) {
    use tokio::signal::unix::{signal, SignalKind};

    rt.spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!("Cannot listen for SIGHUP, log level will not be reloadable: {}", e);
                return;
            }
        };
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading log level.");
            reload_requested.store(true, Ordering::Relaxed);
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_rt: &Runtime, _reload_requested: Arc<AtomicBool>) {}
