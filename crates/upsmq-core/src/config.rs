//! Configuration types for the UPS bridge
//!
//! This module defines all configuration structures used throughout the
//! crate. Every field has a default, so an empty JSON document is a
//! valid configuration for a local NUT server and a local broker.

use serde::{Deserialize, Serialize};

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Polling behavior
    #[serde(default)]
    pub general: GeneralConfig,

    /// Which UPS to query
    #[serde(default)]
    pub ups: UpsConfig,

    /// Broker connection and topic layout
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl BridgeConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            general: GeneralConfig::default(),
            ups: UpsConfig::default(),
            mqtt: MqttConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.general.poll_interval_secs == 0 {
            return Err(crate::Error::config("poll_interval_secs must be > 0"));
        }

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        self.ups.validate()?;
        self.mqtt.validate()?;

        Ok(())
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render the configuration as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Polling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seconds between polling cycles
    ///
    /// The sleep starts after a cycle completes, so slow cycles stretch
    /// the effective period; drift is not compensated.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// UPS addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsConfig {
    /// UPS name as known to the NUT server
    #[serde(default = "default_ups_name")]
    pub name: String,

    /// Host running the NUT server
    #[serde(default = "default_ups_host")]
    pub host: String,

    /// Location tag used as a topic segment
    #[serde(default = "default_location")]
    pub location: String,
}

impl UpsConfig {
    /// Argument passed to `upsc`
    ///
    /// Local UPSes are addressed by bare name, remote ones as
    /// `name@host`.
    pub fn target(&self) -> String {
        if self.host.is_empty() || self.host == "localhost" {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.host)
        }
    }

    /// Validate the UPS configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("ups name cannot be empty"));
        }
        if self.name.contains('@') {
            return Err(crate::Error::config(
                "ups name cannot contain '@'; set the host field instead",
            ));
        }
        if self.location.is_empty() {
            return Err(crate::Error::config("location cannot be empty"));
        }
        if self.location.contains('/') {
            return Err(crate::Error::config("location cannot contain '/'"));
        }
        Ok(())
    }
}

impl Default for UpsConfig {
    fn default() -> Self {
        Self {
            name: default_ups_name(),
            host: default_ups_host(),
            location: default_location(),
        }
    }
}

/// Broker connection and topic layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Broker username; set together with `password` or not at all
    #[serde(default)]
    pub username: Option<String>,

    /// Broker password; set together with `username` or not at all
    #[serde(default)]
    pub password: Option<String>,

    /// First segment of every published topic
    #[serde(default = "default_base_topic")]
    pub base_topic: String,

    /// Client id presented to the broker (generated when unset)
    #[serde(default)]
    pub client_id: Option<String>,

    /// MQTT keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl MqttConfig {
    /// Validate the broker configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("mqtt host cannot be empty"));
        }
        if self.port == 0 {
            return Err(crate::Error::config("mqtt port must be > 0"));
        }
        if self.base_topic.is_empty() {
            return Err(crate::Error::config("base_topic cannot be empty"));
        }
        if self.base_topic.contains('/') {
            return Err(crate::Error::config("base_topic cannot contain '/'"));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(crate::Error::config(
                "mqtt username and password must be set together",
            ));
        }
        if let Some(id) = &self.client_id
            && id.is_empty()
        {
            return Err(crate::Error::config("client_id cannot be empty when set"));
        }
        // The MQTT client rejects keep-alive intervals under 5 seconds
        if self.keep_alive_secs < 5 {
            return Err(crate::Error::config("keep_alive_secs must be at least 5"));
        }
        Ok(())
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            username: None,
            password: None,
            base_topic: default_base_topic(),
            client_id: None,
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    /// This prevents unbounded memory growth when nothing drains the
    /// receiver.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_ups_name() -> String {
    "ups".to_string()
}

fn default_ups_host() -> String {
    "localhost".to_string()
}

fn default_location() -> String {
    "north".to_string()
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_base_topic() -> String {
    "ups".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    64
}
