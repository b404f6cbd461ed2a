//! MQTT topic construction
//!
//! Every published field lands on
//! `{base_topic}/{location}/ups/{model}/{field}`. The scheme is part of
//! the wire contract: subscribers key their dashboards off these exact
//! paths, so the layout must not drift.

use crate::error::{Error, Result};

/// Fixed literal between the location and model segments
const DEVICE_CLASS: &str = "ups";

/// Topic layout for one bridge instance
///
/// Validated at construction so a bad `base_topic` or `location`
/// surfaces as a configuration error instead of a malformed topic at
/// publish time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    base: String,
    location: String,
}

impl TopicScheme {
    /// Build a scheme, rejecting empty or `/`-bearing segments
    pub fn new(base: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        let base = base.into();
        let location = location.into();

        validate_segment("base_topic", &base)?;
        validate_segment("location", &location)?;

        Ok(Self { base, location })
    }

    /// Topic for one telemetry field of one device
    pub fn field_topic(&self, model: &str, field: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.base, self.location, DEVICE_CLASS, model, field
        )
    }

    /// Configured base topic
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Configured location segment
    pub fn location(&self) -> &str {
        &self.location
    }
}

fn validate_segment(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::config(format!("{name} cannot be empty")));
    }
    if value.contains('/') {
        return Err(Error::config(format!(
            "{name} cannot contain '/': {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_topic_layout() {
        let scheme = TopicScheme::new("ups", "north").unwrap();
        assert_eq!(
            scheme.field_topic("Back_UPS_RS_1000G", "battery_charge"),
            "ups/north/ups/Back_UPS_RS_1000G/battery_charge"
        );
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(TopicScheme::new("", "north").is_err());
        assert!(TopicScheme::new("ups", "").is_err());
    }

    #[test]
    fn rejects_slashes_in_segments() {
        assert!(TopicScheme::new("ups/extra", "north").is_err());
        assert!(TopicScheme::new("ups", "north/east").is_err());
    }

    #[test]
    fn accessors_return_configured_values() {
        let scheme = TopicScheme::new("telemetry", "basement").unwrap();
        assert_eq!(scheme.base(), "telemetry");
        assert_eq!(scheme.location(), "basement");
    }
}
