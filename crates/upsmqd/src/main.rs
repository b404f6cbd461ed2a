// # upsmqd - UPS Bridge Daemon
//
// Production daemon for the upsmq engine. Wires together:
// - UpscSource: reads UPS status by running `upsc`
// - MqttPublisher: delivers retained telemetry to an MQTT broker
// - BridgeEngine: polls, diffs, and publishes on a fixed interval
//
// ## Responsibilities
//
// 1. Load the JSON configuration, writing a default file on first run
// 2. Install logging and build the async runtime
// 3. Run the engine until SIGTERM or SIGINT arrives
// 4. Disconnect from the broker and drain engine events on the way out
//
// ## Configuration
//
// The configuration file path comes from UPSMQ_CONFIG and defaults to
// conf/config.json relative to the working directory. A missing file
// is created with defaults so there is always a file to edit.
// UPSMQ_LOG_LEVEL selects the log level (trace, debug, info, warn,
// error; default info).
//
// ```bash
// UPSMQ_CONFIG=/etc/upsmq/config.json UPSMQ_LOG_LEVEL=debug upsmqd
// ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use upsmq_core::{BridgeConfig, BridgeEngine, EngineEvent};
use upsmq_publisher_mqtt::MqttPublisher;
use upsmq_status_upsc::UpscSource;

const DEFAULT_CONFIG_PATH: &str = "conf/config.json";

/// Exit codes follow the conventions systemd expects from a long
/// running service: 0 for a requested shutdown, 1 for configuration
/// problems, 2 for runtime failures.
enum UpsmqExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<UpsmqExitCode> for ExitCode {
    fn from(code: UpsmqExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let path = config_path();

    // Tracing is not up yet, so configuration problems go to stderr.
    let config = match load_or_init_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return UpsmqExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return UpsmqExitCode::ConfigError.into();
    }

    let level = match log_level_from_env() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{:#}", e);
            return UpsmqExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logging subscriber: {}", e);
        return UpsmqExitCode::ConfigError.into();
    }

    info!("Starting upsmqd");
    info!("Using configuration {}", path.display());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build async runtime: {}", e);
            return UpsmqExitCode::RuntimeError.into();
        }
    };

    match runtime.block_on(run_daemon(config)) {
        Ok(()) => {
            info!("Daemon stopped");
            UpsmqExitCode::CleanShutdown.into()
        }
        Err(e) => {
            error!("Daemon failed: {:#}", e);
            UpsmqExitCode::RuntimeError.into()
        }
    }
}

/// Wire the components together and run the engine until shutdown
async fn run_daemon(config: BridgeConfig) -> anyhow::Result<()> {
    let target = config.ups.target();
    info!("Polling UPS {} via upsc", target);
    info!(
        "Publishing to {}:{} under {}/{}",
        config.mqtt.host, config.mqtt.port, config.mqtt.base_topic, config.ups.location
    );

    let source = UpscSource::new(target);
    let publisher = MqttPublisher::new(&config.mqtt)?;

    // The engine consumes its boxed publisher; keep a clone around for
    // the clean disconnect after it stops.
    let mqtt = publisher.clone();

    let poll_interval = config.general.poll_interval_secs;
    let (mut engine, event_rx) = BridgeEngine::new(Box::new(source), Box::new(publisher), config)?;

    let event_task = tokio::spawn(drain_events(event_rx));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received {}", signal),
            Err(e) => error!("Signal handler failed: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Engine starting (poll interval {}s)", poll_interval);
    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    mqtt.disconnect().await;

    // Dropping the engine closes the event channel, which ends the
    // drain task.
    drop(engine);
    let _ = event_task.await;

    Ok(())
}

/// Log engine events until the channel closes
async fn drain_events(mut rx: tokio::sync::mpsc::Receiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::Started { poll_interval_secs } => {
                info!("Engine started (poll interval {}s)", poll_interval_secs);
            }
            EngineEvent::FieldPublished {
                field,
                value,
                topic,
            } => {
                debug!("Field {} = {} retained at {}", field, value, topic);
            }
            EngineEvent::PublishFailed { field, error } => {
                warn!("Field {} not published: {}", field, error);
            }
            EngineEvent::CycleCompleted {
                changed,
                published,
                failed,
            } => {
                debug!(
                    "Cycle: {} changed, {} published, {} failed",
                    changed, published, failed
                );
            }
            EngineEvent::CycleSkipped { reason } => {
                warn!("Cycle skipped: {}", reason);
            }
            EngineEvent::Stopped { reason } => {
                info!("Engine stopping: {}", reason);
            }
        }
    }
}

fn config_path() -> PathBuf {
    match std::env::var("UPSMQ_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Load the configuration, writing a default file if none exists
fn load_or_init_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    if path.exists() {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return BridgeConfig::from_json(&text)
            .with_context(|| format!("Failed to parse {}", path.display()));
    }

    let config = BridgeConfig::default();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let text = config.to_json_pretty()?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote default configuration to {}", path.display());

    Ok(config)
}

/// Resolve the log level from UPSMQ_LOG_LEVEL (default info)
fn log_level_from_env() -> anyhow::Result<Level> {
    match std::env::var("UPSMQ_LOG_LEVEL") {
        Ok(value) => match value.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            other => anyhow::bail!(
                "Unknown log level {:?} (valid: trace, debug, info, warn, error)",
                other
            ),
        },
        Err(_) => Ok(Level::INFO),
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> anyhow::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to install SIGINT handler: {}", e))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for ctrl-c on platforms without unix signals
#[cfg(not(unix))]
async fn wait_for_shutdown() -> anyhow::Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to listen for ctrl-c: {}", e))?;
    Ok("SIGINT")
}
