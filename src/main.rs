pub mod config;
pub mod console;
pub mod mqtt;

use std::sync::Arc;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

use crate::config::ConsoleConfig;
use crate::console::commands::CommandTable;
use crate::console::control_loop::{ControlLoop, ExitReason, LoopTiming};
use crate::console::dispatcher::CommandDispatcher;
use crate::console::feedback::FeedbackSubscriber;
use crate::console::operator::StdioOperator;
use crate::mqtt::mqtt_handler::MqttHandler;
use crate::mqtt::topics::TopicRegistry;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type LogLevelHandle = reload::Handle<LevelFilter, Registry>;

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = setup()?;

    let config_path = ConsoleConfig::default_path();
    let config = ConsoleConfig::load(&config_path).await.map_err(|e| {
        eyre!(
            "Failed to load configuration from {}: {} (edit the file or set MQTT_HOST, MQTT_USER, MQTT_PASS, DEVICE_ID)",
            config_path.display(),
            e
        )
    })?;
    let level = LevelFilter::from_level(config.log_level()?);
    log_level
        .modify(|filter| *filter = level)
        .map_err(|e| eyre!("Failed to apply log level: {}", e))?;
    info!("Using configuration {}", config_path.display());

    let topics = Arc::new(TopicRegistry::new(config.device_id.clone()));
    info!("Controlling bike {}", topics.device_id());
    for channel in topics.channels() {
        debug!(
            "{} ({:?}) -> {}",
            channel.role, channel.direction, channel.routed_name
        );
    }
    let commands = Arc::new(CommandTable::smartbike()?);

    let subscriber =
        FeedbackSubscriber::from_roles(&topics, &config.feedback.roles, &config.feedback.topics);
    let dispatcher = CommandDispatcher::new(commands, topics);
    let control_loop = ControlLoop::new(
        dispatcher,
        subscriber,
        LoopTiming::from(&config.timing),
    );

    let (handler, mut event_loop) = MqttHandler::connect(&config.mqtt)
        .map_err(|e| eyre!("Failed to set up MQTT connection: {}", e))?;

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                interrupt.cancel();
            }
            Err(e) => error!("Unable to listen for interrupt signal: {}", e),
        }
    });

    let mut operator = StdioOperator::new();
    let exit = control_loop.run(&mut operator, &handler, shutdown).await;
    info!("Session ended: {:?}", exit);

    match tokio::time::timeout(SHUTDOWN_GRACE, handler.disconnect()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("{}", e),
        Err(_) => warn!("Disconnect request timed out"),
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut event_loop)
        .await
        .is_err()
    {
        warn!("MQTT event loop did not stop in time, aborting it");
        event_loop.abort();
    }

    match exit.reason {
        ExitReason::Failed(reason) => Err(eyre!("Console stopped: {}", reason)),
        ExitReason::Interrupted | ExitReason::InputClosed => Ok(()),
    }
}

/// Installs error reporting and an INFO logger; the returned handle lets the
/// configured level replace INFO once the config file has been read.
fn setup() -> Result<LogLevelHandle> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(setup_logging())
}

/// Logs go to stderr so they do not interleave with the prompt on stdout.
fn setup_logging() -> LogLevelHandle {
    let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
    handle
}
