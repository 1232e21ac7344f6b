use serde_json::{Number, Value};
use telelink_frame::SensorValue;

/// JSON form of a sensor value. Non-finite floats become `null`.
pub fn value_to_json(value: SensorValue) -> Value {
    match value {
        SensorValue::Unsigned(v) => Value::from(v),
        SensorValue::Signed(v) => Value::from(v),
        SensorValue::Float(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
    }
}

/// Sensor value from a JSON number.
///
/// Non-negative integers map to `Unsigned`, negative ones to `Signed`, and
/// anything else numeric to `Float`. Whether the value fits its field is
/// checked when it is stored.
pub fn value_from_json(value: &Value) -> Option<SensorValue> {
    if let Some(v) = value.as_u64() {
        Some(SensorValue::Unsigned(v))
    } else if let Some(v) = value.as_i64() {
        Some(SensorValue::Signed(v))
    } else {
        value.as_f64().map(SensorValue::Float)
    }
}
