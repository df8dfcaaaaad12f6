//! Writes extracted readings into the state store.
//!
//! Layout under a phone group:
//!
//! ```text
//! Phone_<id>                     device
//! Phone_<id>.<Sensor>            channel, display name kept as node name
//! Phone_<id>.<Sensor>.id         vendor id
//! Phone_<id>.<Sensor>.timestamp  vendor time of the last update
//! Phone_<id>.<Sensor>.<field>    one state per measured field
//! ```

use crate::config::SensorsConfig;
use crate::models::field::{FieldKey, ValueType};
use crate::models::reading::{FieldValue, SensorReading};
use crate::models::target::PollTarget;
use crate::normalizer::{naming, wind};
use crate::store::{NodeDescriptor, SinkWriteError, StateStore};
use log::{debug, error};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    pub sensors: usize,
    pub values: usize,
    pub failures: usize,
}

impl PublishStats {
    fn record(&mut self, path: &str, result: Result<(), SinkWriteError>) {
        match result {
            Ok(()) => self.values += 1,
            Err(e) => {
                error!("Failed to write {}: {}", path, e);
                self.failures += 1;
            }
        }
    }
}

/// Picks a unique path segment per reading, in document order.
///
/// Colliding names get the vendor id appended, or the 1-based position
/// when there is no id.
pub fn channel_segments(readings: &[SensorReading]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut segments = Vec::with_capacity(readings.len());

    for (i, reading) in readings.iter().enumerate() {
        let index = i + 1;
        let mut segment = naming::sanitize(&reading.name);
        if segment.is_empty() {
            segment = naming::fallback_name(index);
        }

        if taken.contains(&segment) {
            let by_id = reading
                .id
                .as_deref()
                .map(|id| format!("{}_{}", segment, naming::sanitize(id)))
                .filter(|candidate| !taken.contains(candidate));
            segment = match by_id {
                Some(candidate) => candidate,
                None => {
                    let mut candidate = format!("{}_{}", segment, index);
                    let mut n = 2;
                    while taken.contains(&candidate) {
                        candidate = format!("{}_{}_{}", segment, index, n);
                        n += 1;
                    }
                    candidate
                }
            };
        }

        taken.insert(segment.clone());
        segments.push(segment);
    }

    segments
}

fn field_value(key: FieldKey, value: &FieldValue, settings: &SensorsConfig) -> Value {
    match value {
        FieldValue::Number(n) if key.is_wind_speed() => Value::from(wind::convert(*n, settings.wind_unit)),
        FieldValue::Number(n) => Value::from(*n),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Unavailable => Value::Null,
    }
}

fn write_state<S: StateStore>(
    store: &mut S,
    path: &str,
    descriptor: &NodeDescriptor,
    value: Value,
) -> Result<(), SinkWriteError> {
    store.ensure_node(path, descriptor)?;
    store.write_value(path, value)
}

/// Publishes the readings of one phone id. Write failures are logged per
/// path and do not stop the remaining writes.
pub fn publish<S: StateStore>(
    store: &mut S,
    target: &PollTarget,
    readings: &[SensorReading],
    settings: &SensorsConfig,
) -> PublishStats {
    let mut stats = PublishStats::default();

    let group = NodeDescriptor::device(format!("Phone {}", target.phone_id));
    if let Err(e) = store.ensure_node(&target.group, &group) {
        error!("Failed to create {}: {}", target.group, e);
        stats.failures += 1;
        return stats;
    }

    for (reading, segment) in readings.iter().zip(channel_segments(readings)) {
        let channel = format!("{}.{}", target.group, segment);
        if let Err(e) = store.ensure_node(&channel, &NodeDescriptor::channel(reading.name.as_str())) {
            error!("Failed to create {}: {}", channel, e);
            stats.failures += 1;
            continue;
        }
        stats.sensors += 1;

        if let Some(id) = &reading.id {
            let path = format!("{}.id", channel);
            let descriptor = NodeDescriptor::state("Sensor id", ValueType::String, "text", "");
            stats.record(&path, write_state(store, &path, &descriptor, Value::from(id.as_str())));
        }

        if settings.show_timestamp {
            if let Some(timestamp) = &reading.timestamp {
                let path = format!("{}.timestamp", channel);
                let descriptor = NodeDescriptor::state("Last update", ValueType::String, "date", "");
                stats.record(&path, write_state(store, &path, &descriptor, Value::from(timestamp.as_str())));
            }
        }

        for (key, value) in &reading.fields {
            if *key == FieldKey::Battery && !settings.show_battery {
                continue;
            }

            let path = format!("{}.{}", channel, key.as_key());
            let descriptor = NodeDescriptor::from(&key.describe(settings.wind_unit));
            let value = field_value(*key, value, settings);
            debug!("{} = {}", path, value);
            stats.record(&path, write_state(store, &path, &descriptor, value));
        }
    }

    stats
}
