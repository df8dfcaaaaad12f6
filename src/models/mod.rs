pub mod field;
pub mod reading;
pub mod target;

pub use field::{FieldDescriptor, FieldKey, ValueType};
pub use reading::{FieldValue, SensorReading};
pub use target::PollTarget;
