use crate::models::field::FieldKey;
use indexmap::IndexMap;

/// Typed value of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    /// The portal printed an "unavailable" marker (`---`, `OFL`, ...).
    Unavailable,
}

/// One sensor block found on a status page.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Display name as shown on the page, unsanitized.
    pub name: String,
    pub id: Option<String>,
    /// Vendor time of the last update, kept verbatim.
    pub timestamp: Option<String>,
    pub fields: IndexMap<FieldKey, FieldValue>,
}

impl SensorReading {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            timestamp: None,
            fields: IndexMap::new(),
        }
    }

    pub fn field(&self, key: FieldKey) -> Option<&FieldValue> {
        self.fields.get(&key)
    }

    pub fn number(&self, key: FieldKey) -> Option<f64> {
        match self.fields.get(&key) {
            Some(FieldValue::Number(value)) => Some(*value),
            _ => None,
        }
    }
}
