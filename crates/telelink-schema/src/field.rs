use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Unsigned integer width a quantized float is packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawWidth {
    U8,
    U16,
    U32,
}

impl RawWidth {
    pub const fn size(self) -> usize {
        match self {
            RawWidth::U8 => 1,
            RawWidth::U16 => 2,
            RawWidth::U32 => 4,
        }
    }

    /// Largest raw value representable in this width.
    pub const fn max_raw(self) -> u64 {
        match self {
            RawWidth::U8 => u8::MAX as u64,
            RawWidth::U16 => u16::MAX as u64,
            RawWidth::U32 => u32::MAX as u64,
        }
    }
}

/// Semantic type and wire encoding of a field.
///
/// Integers and raw floats go on the wire as their little-endian bytes.
/// `Quantized` fields are floats on both ends but travel as a scaled,
/// biased unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Quantized { raw: RawWidth, scale: f64, bias: f64 },
}

impl FieldKind {
    /// Bytes this field occupies on the wire.
    pub const fn size(&self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::I8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => 4,
            FieldKind::U64 | FieldKind::I64 | FieldKind::F64 => 8,
            FieldKind::Quantized { raw, .. } => raw.size(),
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            FieldKind::F32 | FieldKind::F64 | FieldKind::Quantized { .. }
        )
    }

    pub const fn is_signed(&self) -> bool {
        matches!(
            self,
            FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64
        )
    }

    /// Short type label, e.g. `u16` or `q16`.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::U8 => "u8",
            FieldKind::I8 => "i8",
            FieldKind::U16 => "u16",
            FieldKind::I16 => "i16",
            FieldKind::U32 => "u32",
            FieldKind::I32 => "i32",
            FieldKind::U64 => "u64",
            FieldKind::I64 => "i64",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Quantized { raw, .. } => match raw {
                RawWidth::U8 => "q8",
                RawWidth::U16 => "q16",
                RawWidth::U32 => "q32",
            },
        }
    }
}

/// One named sensor quantity in a schema. Immutable once the schema is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorField {
    name: String,
    tier: Tier,
    kind: FieldKind,
    event: Option<u8>,
}

impl SensorField {
    pub(crate) fn new(name: String, tier: Tier, kind: FieldKind, event: Option<u8>) -> Self {
        Self {
            name,
            tier,
            kind,
            event,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Wire size in bytes.
    pub fn size(&self) -> usize {
        self.kind.size()
    }

    /// Conditional event index (conditional fields only).
    pub fn event(&self) -> Option<u8> {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_packed_wire_sizes() {
        assert_eq!(FieldKind::U8.size(), 1);
        assert_eq!(FieldKind::I16.size(), 2);
        assert_eq!(FieldKind::F32.size(), 4);
        assert_eq!(FieldKind::F64.size(), 8);
        let q = FieldKind::Quantized {
            raw: RawWidth::U16,
            scale: 10.0,
            bias: -40.0,
        };
        assert_eq!(q.size(), 2);
        assert!(q.is_float());
        assert_eq!(q.label(), "q16");
    }

    #[test]
    fn kind_definition_json_shape() {
        let kind: FieldKind = serde_json::from_str(r#"{"type":"u16"}"#).unwrap();
        assert_eq!(kind, FieldKind::U16);

        let kind: FieldKind =
            serde_json::from_str(r#"{"type":"quantized","raw":"u16","scale":10.0,"bias":-40.0}"#)
                .unwrap();
        assert_eq!(
            kind,
            FieldKind::Quantized {
                raw: RawWidth::U16,
                scale: 10.0,
                bias: -40.0
            }
        );
    }
}
