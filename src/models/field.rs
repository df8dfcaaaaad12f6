use crate::normalizer::wind::WindUnit;
use crate::normalizer::ValueShape;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every measurement the portal is known to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Temperature,
    TemperatureIn,
    TemperatureOut,
    TemperatureCable,
    /// Numbered probe of a multi-sensor station, 1..=8.
    TemperatureProbe(u8),
    Humidity,
    HumidityIn,
    HumidityOut,
    HumidityAvg3h,
    HumidityAvg24h,
    HumidityAvg7d,
    HumidityAvg30d,
    RainTotal,
    Rain1h,
    Rain24h,
    WindSpeed,
    WindGust,
    WindDirection,
    Battery,
    Contact,
    Wet,
}

/// Value type recorded in a state node's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    String,
    Boolean,
}

/// Metadata attached to the state node of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub role: &'static str,
    pub unit: &'static str,
    pub value_type: ValueType,
}

impl FieldKey {
    pub fn as_key(&self) -> String {
        let key = match self {
            FieldKey::Temperature => "temperature",
            FieldKey::TemperatureIn => "temperature_in",
            FieldKey::TemperatureOut => "temperature_out",
            FieldKey::TemperatureCable => "temperature_cable",
            FieldKey::TemperatureProbe(n) => return format!("temperature_probe_{}", n),
            FieldKey::Humidity => "humidity",
            FieldKey::HumidityIn => "humidity_in",
            FieldKey::HumidityOut => "humidity_out",
            FieldKey::HumidityAvg3h => "humidity_avg_3h",
            FieldKey::HumidityAvg24h => "humidity_avg_24h",
            FieldKey::HumidityAvg7d => "humidity_avg_7d",
            FieldKey::HumidityAvg30d => "humidity_avg_30d",
            FieldKey::RainTotal => "rain_total",
            FieldKey::Rain1h => "rain_1h",
            FieldKey::Rain24h => "rain_24h",
            FieldKey::WindSpeed => "wind_speed",
            FieldKey::WindGust => "wind_gust",
            FieldKey::WindDirection => "wind_direction",
            FieldKey::Battery => "battery",
            FieldKey::Contact => "contact",
            FieldKey::Wet => "wet",
        };
        key.to_string()
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            FieldKey::WindDirection => ValueShape::Text,
            FieldKey::Battery | FieldKey::Contact | FieldKey::Wet => ValueShape::State,
            _ => ValueShape::Number,
        }
    }

    /// Whether the value is a speed in m/s that follows the wind unit setting.
    pub fn is_wind_speed(&self) -> bool {
        matches!(self, FieldKey::WindSpeed | FieldKey::WindGust)
    }

    pub fn value_type(&self) -> ValueType {
        match self.shape() {
            ValueShape::Number => ValueType::Number,
            ValueShape::State => ValueType::Boolean,
            ValueShape::Text => ValueType::String,
        }
    }

    /// Derives the (name, role, unit, type) metadata for this key.
    pub fn describe(&self, wind_unit: WindUnit) -> FieldDescriptor {
        let (name, role, unit): (String, &'static str, &'static str) = match self {
            FieldKey::Temperature => ("Temperature".into(), "value.temperature", "°C"),
            FieldKey::TemperatureIn => ("Temperature inside".into(), "value.temperature", "°C"),
            FieldKey::TemperatureOut => ("Temperature outside".into(), "value.temperature", "°C"),
            FieldKey::TemperatureCable => ("Temperature cable probe".into(), "value.temperature", "°C"),
            FieldKey::TemperatureProbe(n) => (format!("Temperature probe {}", n), "value.temperature", "°C"),
            FieldKey::Humidity => ("Humidity".into(), "value.humidity", "%"),
            FieldKey::HumidityIn => ("Humidity inside".into(), "value.humidity", "%"),
            FieldKey::HumidityOut => ("Humidity outside".into(), "value.humidity", "%"),
            FieldKey::HumidityAvg3h => ("Humidity average 3h".into(), "value.humidity", "%"),
            FieldKey::HumidityAvg24h => ("Humidity average 24h".into(), "value.humidity", "%"),
            FieldKey::HumidityAvg7d => ("Humidity average 7d".into(), "value.humidity", "%"),
            FieldKey::HumidityAvg30d => ("Humidity average 30d".into(), "value.humidity", "%"),
            FieldKey::RainTotal => ("Rain total".into(), "value.precipitation", "mm"),
            FieldKey::Rain1h => ("Rain last hour".into(), "value.precipitation.hour", "mm"),
            FieldKey::Rain24h => ("Rain last 24h".into(), "value.precipitation.day", "mm"),
            FieldKey::WindSpeed => ("Wind speed".into(), "value.speed.wind", wind_unit.label()),
            FieldKey::WindGust => ("Wind gust".into(), "value.speed.wind.gust", wind_unit.label()),
            FieldKey::WindDirection => ("Wind direction".into(), "weather.direction.wind", ""),
            FieldKey::Battery => ("Battery low".into(), "indicator.lowbat", ""),
            FieldKey::Contact => ("Contact open".into(), "sensor.window", ""),
            FieldKey::Wet => ("Water detected".into(), "sensor.alarm.flood", ""),
        };

        FieldDescriptor {
            name,
            role,
            unit,
            value_type: self.value_type(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}
