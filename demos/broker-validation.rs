// # MQTT Broker Validation Tool
//
// Publishes a retained test message through the MqttPublisher against a
// real broker in a controlled environment.
//
// ## Usage
//
// ```bash
// UPSMQ_MQTT_HOST=localhost \
// UPSMQ_MQTT_PORT=1883 \
// UPSMQ_TEST_TOPIC=ups/validation/ups/Test/battery_charge \
// cargo run --bin broker_validation
// ```
//
// ## Environment Variables
//
// Optional:
// - `UPSMQ_MQTT_HOST`: broker host (default: localhost)
// - `UPSMQ_MQTT_PORT`: broker port (default: 1883)
// - `UPSMQ_MQTT_USERNAME` / `UPSMQ_MQTT_PASSWORD`: credentials
// - `UPSMQ_TEST_TOPIC`: topic for the test message
//
// The message is retained, so a subscriber attaching afterwards still
// sees it.

use std::env;

use upsmq_core::config::MqttConfig;
use upsmq_core::traits::Publisher;
use upsmq_publisher_mqtt::MqttPublisher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== MQTT Broker Validation ===");

    let mut config = MqttConfig::default();
    if let Ok(host) = env::var("UPSMQ_MQTT_HOST") {
        config.host = host;
    }
    if let Ok(port) = env::var("UPSMQ_MQTT_PORT") {
        config.port = port.parse().expect("Invalid port");
    }
    config.username = env::var("UPSMQ_MQTT_USERNAME").ok();
    config.password = env::var("UPSMQ_MQTT_PASSWORD").ok();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid broker configuration: {}", e);
        std::process::exit(1);
    }

    let topic = env::var("UPSMQ_TEST_TOPIC")
        .unwrap_or_else(|_| "ups/validation/ups/Test/battery_charge".to_string());

    tracing::info!("Configuration:");
    tracing::info!("  Broker: {}:{}", config.host, config.port);
    tracing::info!("  Topic: {}", topic);
    tracing::info!(
        "  Credentials: {}",
        if config.username.is_some() {
            "set"
        } else {
            "none"
        }
    );

    tracing::info!("\n--- Step 1: Creating Client ---");
    let publisher = MqttPublisher::new(&config)?;
    tracing::info!("✓ Client configured; the connection runs in the background");

    // Give the event loop a moment to reach the broker
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    tracing::info!("\n--- Step 2: Publishing Retained Message ---");
    match publisher.publish(&topic, "100").await {
        Ok(()) => tracing::info!("✓ Publish accepted: {} = 100", topic),
        Err(e) => {
            tracing::error!("✗ Publish failed: {}", e);
            std::process::exit(1);
        }
    }

    // Let the in-flight message reach the broker before disconnecting
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    tracing::info!("\n--- Step 3: Disconnecting ---");
    publisher.disconnect().await;
    tracing::info!("✓ Disconnected");

    tracing::info!("\n=== Validation Summary ===");
    tracing::info!("✓ Client setup: OK");
    tracing::info!("✓ Retained publish: OK");
    tracing::info!("✓ Clean disconnect: OK");
    tracing::info!(
        "Verify with: mosquitto_sub -h {} -t '{}' -v",
        config.host,
        topic
    );

    Ok(())
}
