//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without talking to a real NUT server or MQTT broker.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use upsmq_core::BridgeConfig;
use upsmq_core::error::{Error, Result};
use upsmq_core::traits::{Publisher, StatusSource};

/// A status source that replays a scripted sequence of fetch outcomes
///
/// The last entry repeats once the script runs out, so a long running
/// engine always has something to fetch.
pub struct ScriptedSource {
    /// Queued fetch outcomes; Err entries become source failures
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    /// Call counter for fetch()
    fetch_call_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// Create a source that replays the given outcomes in order
    pub fn with_script(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a source that replays successful dumps
    pub fn replaying(dumps: &[&str]) -> Self {
        Self::with_script(dumps.iter().map(|d| Ok(d.to_string())).collect())
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedSource that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
        }
    }
}

#[async_trait::async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch(&self) -> Result<String> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap();
        let step = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match step {
            Some(Ok(dump)) => Ok(dump),
            Some(Err(message)) => Err(Error::source_unavailable(message)),
            None => Err(Error::source_unavailable("script exhausted")),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

/// A publisher that records every accepted message
///
/// Individual topics can be told to fail, which models a broker that
/// rejects specific publishes.
pub struct RecordingPublisher {
    /// Accepted (topic, payload) pairs in publish order
    published: Arc<Mutex<Vec<(String, String)>>>,
    /// Call counter for publish(), failed calls included
    publish_call_count: Arc<AtomicUsize>,
    /// Topics that currently fail
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            publish_call_count: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make publishes to the given topic fail from now on
    pub fn fail_topic(&self, topic: &str) {
        self.failing.lock().unwrap().insert(topic.to_string());
    }

    /// Let publishes to the given topic succeed again
    pub fn heal_topic(&self, topic: &str) {
        self.failing.lock().unwrap().remove(topic);
    }

    /// Get the accepted messages in publish order
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    /// Get the number of times publish() was called
    pub fn publish_call_count(&self) -> usize {
        self.publish_call_count.load(Ordering::SeqCst)
    }

    /// Create a new RecordingPublisher that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            published: Arc::clone(&other.published),
            publish_call_count: Arc::clone(&other.publish_call_count),
            failing: Arc::clone(&other.failing),
        }
    }
}

#[async_trait::async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.publish_call_count.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(topic) {
            return Err(Error::publish(topic, "injected failure"));
        }

        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn publisher_name(&self) -> &'static str {
        "recording"
    }
}

/// Helper to create a minimal BridgeConfig for testing
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.general.poll_interval_secs = 1;
    config.engine.event_channel_capacity = 100;
    config
}
