use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::{MqttConfig, MqttConfigError};
use super::message_manager::MqttMessage;
use super::transport::{Transport, TransportError};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

/// Broker connection backed by rumqttc.
///
/// The handle only queues requests; the [`EventLoop`] does the network work
/// and runs as a background task started by [`MqttHandler::connect`].
pub struct MqttHandler {
    client: AsyncClient,
    qos: QoS,
    state: watch::Receiver<ConnectionState>,
}

impl MqttHandler {
    /// Opens the connection and starts the background receive loop.
    pub fn connect(config: &MqttConfig) -> Result<(Self, JoinHandle<()>), MqttConfigError> {
        let (host, port) = config.server.host_and_port()?;
        let qos = config.qos()?;

        let mut mqtt_options = MqttOptions::new(config.client_id.clone(), host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if !config.server.user.is_empty() {
            mqtt_options.set_credentials(config.server.user.clone(), config.server.pw.clone());
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, config.channel_capacity);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        info!("Connecting to MQTT broker {}", config.server);
        let handle = tokio::spawn(run_event_loop(event_loop, state_tx));

        Ok((
            MqttHandler {
                client,
                qos,
                state: state_rx,
            },
            handle,
        ))
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Asks the broker to close the session; the receive loop ends once the
    /// disconnect has gone out.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| TransportError::Disconnect(e.to_string()))
    }

    fn warn_if_offline(&self, action: &str, topic: &str) {
        let state = self.connection_state();
        if state != ConnectionState::Connected {
            warn!("{} {} while broker connection is {:?}; request is queued", action, topic, state);
        }
    }
}

#[async_trait]
impl Transport for MqttHandler {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.warn_if_offline("Publishing to", topic);
        self.client
            .publish(topic, self.qos, false, payload)
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
        self.warn_if_offline("Subscribing to", pattern);
        self.client
            .subscribe(pattern, self.qos)
            .await
            .map_err(|e| TransportError::Subscribe {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Drives the rumqttc event loop for the lifetime of the connection.
///
/// Inbound publishes are logged as feedback. Poll errors are logged and
/// polling resumes after a short pause, which makes rumqttc reconnect.
async fn run_event_loop(mut event_loop: EventLoop, state: watch::Sender<ConnectionState>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!("Connected to MQTT broker ({:?})", ack.code);
                state.send_replace(ConnectionState::Connected);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let msg = MqttMessage::from_publish(&publish.topic, &publish.payload);
                info!("Feedback {}", msg);
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                debug!("Subscription {} acknowledged: {:?}", ack.pkid, ack.return_codes);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("Disconnected from MQTT broker");
                state.send_replace(ConnectionState::Disconnected);
                break;
            }
            Ok(event) => {
                debug!("MQTT event: {:?}", event);
            }
            Err(e) => {
                error!("MQTT connection error: {}", e);
                state.send_replace(ConnectionState::Reconnecting);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
