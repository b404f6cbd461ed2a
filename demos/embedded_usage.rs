//! Minimal embedding example for upsmq-core
//!
//! This example demonstrates using upsmq-core as a library in a custom
//! application. The engine lifecycle is fully managed by the application.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use upsmq_core::{
    BridgeConfig, BridgeEngine, Result,
    traits::{Publisher, StatusSource},
};

/// Status source that replays canned upsc output
struct EmbeddedSource {
    dumps: Vec<String>,
    cursor: Mutex<usize>,
}

impl EmbeddedSource {
    fn new(dumps: Vec<&str>) -> Self {
        Self {
            dumps: dumps.into_iter().map(String::from).collect(),
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl StatusSource for EmbeddedSource {
    async fn fetch(&self) -> Result<String> {
        let mut cursor = self.cursor.lock().unwrap();
        let dump = self.dumps[(*cursor).min(self.dumps.len() - 1)].clone();
        *cursor += 1;
        Ok(dump)
    }

    fn source_name(&self) -> &str {
        "embedded"
    }
}

/// Publisher that prints instead of talking to a broker
struct ConsolePublisher {
    published: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait::async_trait]
impl Publisher for ConsolePublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        println!("[Embedded] {} <- {}", topic, payload);
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn publisher_name(&self) -> &'static str {
        "console"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded upsmq-core Example ===\n");

    // Three polling cycles worth of upsc output: the second is identical
    // to the first, the third changes both readings.
    let source = EmbeddedSource::new(vec![
        "battery.charge: 100\nups.status: OL\nups.model: Back-UPS RS 1000G\n",
        "battery.charge: 100\nups.status: OL\nups.model: Back-UPS RS 1000G\n",
        "battery.charge: 95\nups.status: OB\nups.model: Back-UPS RS 1000G\n",
    ]);

    let published = Arc::new(Mutex::new(Vec::new()));
    let publisher = ConsolePublisher {
        published: Arc::clone(&published),
    };

    let mut config = BridgeConfig::default();
    config.general.poll_interval_secs = 1;

    println!("1. Creating engine...");
    let (mut engine, mut event_rx) =
        BridgeEngine::new(Box::new(source), Box::new(publisher), config)?;

    // Drive the schedule by hand instead of engine.run()
    println!("2. Driving three polling cycles by hand...\n");
    for cycle in 1..=3 {
        let stats = engine.poll_once().await?;
        println!(
            "   Cycle {}: {} changed, {} published",
            cycle, stats.changed, stats.published
        );
    }

    println!("\n3. Cache now holds {} fields", engine.cache().len());

    println!("4. Draining engine events...");
    drop(engine);
    while let Some(event) = event_rx.recv().await {
        println!("[Event] {:?}", event);
    }

    let total = published.lock().unwrap().len();
    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- {} retained messages covered 6 field readings", total);
    println!("- Engine lifecycle is fully controlled by application");
    println!("- poll_once() lets the application own the schedule");

    Ok(())
}
