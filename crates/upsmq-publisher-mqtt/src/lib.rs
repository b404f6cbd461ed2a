// # MQTT Publisher
//
// This crate delivers telemetry values to an MQTT broker as retained,
// at-least-once messages.
//
// ## Architecture
//
// A rumqttc `AsyncClient` issues the publishes; a background task
// drives the connection's event loop (keep-alive, acks, automatic
// reconnect). The pipeline never blocks on broker acknowledgment: a
// publish resolves once the client has accepted the message.
//
// Retained messages mean a subscriber joining late still sees the last
// known value of every field, which is the whole point of the bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use upsmq_core::config::MqttConfig;
use upsmq_core::error::{Error, Result};
use upsmq_core::traits::Publisher;

/// Pause before the event loop polls again after a connection error
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// MQTT publisher backed by rumqttc
///
/// Cloning is cheap and shares the underlying connection; the daemon
/// keeps one clone outside the engine so it can disconnect cleanly
/// after the engine stops.
#[derive(Clone, Debug)]
pub struct MqttPublisher {
    client: AsyncClient,

    /// Set during disconnect so the event loop task winds down quietly
    shutting_down: Arc<AtomicBool>,

    event_loop_handle: Arc<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Create a publisher for the broker described by `config`
    ///
    /// Spawns the background event loop task, so this must run inside
    /// a tokio runtime. The TCP connection itself is established
    /// lazily by that task; publishes issued before the broker is
    /// reachable queue inside the client.
    ///
    /// Credentials are applied only when both username and password
    /// are set.
    pub fn new(config: &MqttConfig) -> Result<Self> {
        // rumqttc panics on these instead of returning errors
        if config.keep_alive_secs < 5 {
            return Err(Error::config("keep_alive_secs must be at least 5"));
        }
        if let Some(id) = &config.client_id
            && id.is_empty()
        {
            return Err(Error::config("client_id cannot be empty when set"));
        }

        let client_id = config.client_id.clone().unwrap_or_else(default_client_id);

        let mut options = MqttOptions::new(&client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(true);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 10);

        let shutting_down = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(drive_event_loop(event_loop, Arc::clone(&shutting_down)));

        info!(
            "MQTT client {} configured for {}:{}",
            client_id, config.host, config.port
        );

        Ok(Self {
            client,
            shutting_down,
            event_loop_handle: Arc::new(handle),
        })
    }

    /// Ask the broker for a clean disconnect and stop the event loop task
    pub async fn disconnect(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        if let Err(e) = self.client.disconnect().await {
            debug!("MQTT disconnect request failed: {}", e);
        }

        self.event_loop_handle.abort();
        info!("MQTT client disconnected");
    }
}

#[async_trait::async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        debug!(topic = %topic, payload = %payload, "Publishing retained message");

        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| Error::publish(topic, e.to_string()))
    }

    fn publisher_name(&self) -> &'static str {
        "mqtt"
    }
}

/// Generate a client id unique to this process
fn default_client_id() -> String {
    format!("upsmq-{}", std::process::id())
}

/// Drive the MQTT event loop until shutdown
///
/// rumqttc reconnects by itself; on error we log, pause, and poll
/// again so a dead broker does not spin the task.
async fn drive_event_loop(mut event_loop: EventLoop, shutting_down: Arc<AtomicBool>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!("MQTT connected: {:?}", ack.code);
            }
            Ok(_) => {}
            Err(e) => {
                if shutting_down.load(Ordering::SeqCst) {
                    debug!("MQTT event loop stopped");
                    break;
                }
                error!("MQTT event loop error: {}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
