//! Built-in schema variants.
//!
//! Each board revision carried its own field set. Variants are independent
//! configurations; nothing is shared between them beyond the frame rules.

use crate::error::{Result, SchemaError};
use crate::field::{FieldKind, RawWidth};
use crate::registry::Schema;

/// Names accepted by [`Schema::variant`].
pub const VARIANT_NAMES: [&str; 3] = ["vehicle", "wheels", "scenario"];

const CORNERS: [&str; 4] = ["fl", "fr", "bl", "br"];
const AXES: [&str; 3] = ["x", "y", "z"];

// Quantized kinds carry the resolution of the CAN signal they are read
// from; signed signals are offset by half their raw range.
const WHEEL_SPEED: FieldKind = q16(10.0, 0.0);
const TEMPERATURE: FieldKind = q16(10.0, -40.0);
const CURRENT_LIMIT: FieldKind = q16(10.0, 0.0);
const BATTERY_VOLTAGE: FieldKind = q16(100.0, 0.0);
const BATTERY_CURRENT: FieldKind = q16(100.0, -327.68);
const INERTIAL: FieldKind = q16(2000.0, -16.384);
const COOLANT_FLOW: FieldKind = q16(100.0, 0.0);

const fn q16(scale: f64, bias: f64) -> FieldKind {
    FieldKind::Quantized {
        raw: RawWidth::U16,
        scale,
        bias,
    }
}

impl Schema {
    /// Look up a built-in variant by name.
    pub fn variant(name: &str) -> Result<Self> {
        match name {
            "vehicle" => Self::vehicle(),
            "wheels" => Self::wheels(),
            "scenario" => Self::scenario(),
            other => Err(SchemaError::UnknownVariant(other.to_string())),
        }
    }

    /// Full car layout fed from both CAN buses: wheel speeds, HV battery,
    /// IMU, GPS, inverter and pedal values in Fast; temperatures, coolant
    /// flow and state of charge in Slow. No conditional fields.
    ///
    /// Field order is the order the base-station display lists them in.
    pub fn vehicle() -> Result<Self> {
        let mut builder = Schema::builder("vehicle");
        for corner in CORNERS {
            builder = builder.fast(format!("{corner}_wheel_speed"), WHEEL_SPEED);
        }
        builder = builder
            .fast("hv_battery_voltage", BATTERY_VOLTAGE)
            .fast("motor_temperature", FieldKind::F32);
        for sensor in ["accel", "gyro"] {
            for axis in AXES {
                builder = builder.fast(format!("{sensor}_{axis}"), INERTIAL);
            }
        }
        builder = builder
            .fast("latitude", FieldKind::I32)
            .fast("longitude", FieldKind::I32)
            .fast("rpm", FieldKind::F32)
            .fast("hv_battery_current", BATTERY_CURRENT)
            .fast("hv_max_discharge_current", CURRENT_LIMIT)
            .fast("hv_max_regen_current", CURRENT_LIMIT)
            .fast("rtc", FieldKind::U32)
            .fast("front_brake_pressure", FieldKind::U16)
            .fast("rear_brake_pressure", FieldKind::U16)
            .fast("hv_battery_temperature", FieldKind::I8)
            .fast("tractile_system_status", FieldKind::U8)
            .fast("accel_percentage", FieldKind::I8)
            .fast("brake_percentage", FieldKind::U8)
            .slow("coolant_temperature", TEMPERATURE);
        for corner in CORNERS {
            builder = builder.slow(format!("{corner}_brake_temperature"), TEMPERATURE);
        }
        builder
            .slow("ambient_temperature", TEMPERATURE)
            .slow("inverter_temperature", FieldKind::F32)
            .slow("coolant_flow", COOLANT_FLOW)
            .slow("hv_state_of_charge", FieldKind::U8)
            .build()
    }

    /// Wheel-speed and brake board: four corners, brake pressures and a
    /// packet counter in Fast, one Slow value, a control byte on event 1.
    ///
    /// Speeds and brake temperatures travel as 0.1-resolution u16 rather
    /// than raw floats, and the packet counter is an ordinary Fast field.
    pub fn wheels() -> Result<Self> {
        let mut builder = Schema::builder("wheels");
        for corner in CORNERS {
            builder = builder
                .fast(format!("{corner}_wheel_speed"), WHEEL_SPEED)
                .fast(format!("{corner}_brake_temperature"), TEMPERATURE);
        }
        builder
            .fast("front_brake_pressure", FieldKind::U16)
            .fast("rear_brake_pressure", FieldKind::U16)
            .fast("packetnum", FieldKind::U16)
            .slow("fake_value", FieldKind::U16)
            .conditional("control", 1, FieldKind::U8)
            .build()
    }

    /// Minimal layout: two u16 Fast fields, one u16 Slow field, one
    /// conditional byte on event 1.
    pub fn scenario() -> Result<Self> {
        Schema::builder("scenario")
            .fast("a", FieldKind::U16)
            .fast("b", FieldKind::U16)
            .slow("s", FieldKind::U16)
            .conditional("c", 1, FieldKind::U8)
            .build()
    }
}
