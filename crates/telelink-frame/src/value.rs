use std::fmt;

use telelink_schema::{FieldKind, RawWidth, SensorField};

use crate::error::{FrameError, Result};
use crate::quantize::Quantizer;

/// A sensor reading as held in a [`SensorStore`](crate::SensorStore).
///
/// Quantized fields hold their decoded float; the raw wire integer never
/// leaves the codec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl SensorValue {
    /// Initial value of a slot of this kind.
    pub fn zero(kind: FieldKind) -> Self {
        if kind.is_float() {
            // Quantized fields start at their bias so the zero is encodable.
            match kind {
                FieldKind::Quantized { bias, .. } => SensorValue::Float(bias),
                _ => SensorValue::Float(0.0),
            }
        } else if kind.is_signed() {
            SensorValue::Signed(0)
        } else {
            SensorValue::Unsigned(0)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            SensorValue::Unsigned(v) => v as f64,
            SensorValue::Signed(v) => v as f64,
            SensorValue::Float(v) => v,
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            SensorValue::Unsigned(v) => Some(v),
            SensorValue::Signed(v) => u64::try_from(v).ok(),
            SensorValue::Float(_) => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            SensorValue::Unsigned(v) => i64::try_from(v).ok(),
            SensorValue::Signed(v) => Some(v),
            SensorValue::Float(_) => None,
        }
    }

    /// Write this value in `field`'s wire encoding into `dst`.
    ///
    /// `dst` must be exactly `field.size()` bytes.
    pub(crate) fn encode(self, field: &SensorField, dst: &mut [u8]) -> Result<()> {
        let kind = field.kind();
        match kind {
            FieldKind::U8 => dst.copy_from_slice(&[self.unsigned::<u8>(field)?]),
            FieldKind::U16 => dst.copy_from_slice(&self.unsigned::<u16>(field)?.to_le_bytes()),
            FieldKind::U32 => dst.copy_from_slice(&self.unsigned::<u32>(field)?.to_le_bytes()),
            FieldKind::U64 => dst.copy_from_slice(&self.unsigned::<u64>(field)?.to_le_bytes()),
            FieldKind::I8 => dst.copy_from_slice(&self.signed::<i8>(field)?.to_le_bytes()),
            FieldKind::I16 => dst.copy_from_slice(&self.signed::<i16>(field)?.to_le_bytes()),
            FieldKind::I32 => dst.copy_from_slice(&self.signed::<i32>(field)?.to_le_bytes()),
            FieldKind::I64 => dst.copy_from_slice(&self.signed::<i64>(field)?.to_le_bytes()),
            FieldKind::F32 => dst.copy_from_slice(&self.single(field)?.to_le_bytes()),
            FieldKind::F64 => dst.copy_from_slice(&self.as_f64().to_le_bytes()),
            FieldKind::Quantized { raw, scale, bias } => {
                let quantizer = Quantizer::new(scale, bias).map_err(|source| overflow(field, source))?;
                let packed = quantizer
                    .encode(self.as_f64(), raw)
                    .map_err(|source| overflow(field, source))?;
                // `encode` already checked `packed` against the width.
                match raw {
                    RawWidth::U8 => dst.copy_from_slice(&[packed as u8]),
                    RawWidth::U16 => dst.copy_from_slice(&(packed as u16).to_le_bytes()),
                    RawWidth::U32 => dst.copy_from_slice(&(packed as u32).to_le_bytes()),
                }
            }
        }
        Ok(())
    }

    /// Read a value of `kind` from exactly `kind.size()` bytes.
    pub(crate) fn decode(kind: FieldKind, src: &[u8]) -> Self {
        match kind {
            FieldKind::U8 => SensorValue::Unsigned(u64::from(src[0])),
            FieldKind::U16 => SensorValue::Unsigned(u64::from(u16::from_le_bytes(le(src)))),
            FieldKind::U32 => SensorValue::Unsigned(u64::from(u32::from_le_bytes(le(src)))),
            FieldKind::U64 => SensorValue::Unsigned(u64::from_le_bytes(le(src))),
            FieldKind::I8 => SensorValue::Signed(i64::from(src[0] as i8)),
            FieldKind::I16 => SensorValue::Signed(i64::from(i16::from_le_bytes(le(src)))),
            FieldKind::I32 => SensorValue::Signed(i64::from(i32::from_le_bytes(le(src)))),
            FieldKind::I64 => SensorValue::Signed(i64::from_le_bytes(le(src))),
            FieldKind::F32 => SensorValue::Float(f64::from(f32::from_le_bytes(le(src)))),
            FieldKind::F64 => SensorValue::Float(f64::from_le_bytes(le(src))),
            FieldKind::Quantized { raw, scale, bias } => {
                let packed = match raw {
                    RawWidth::U8 => u64::from(src[0]),
                    RawWidth::U16 => u64::from(u16::from_le_bytes(le(src))),
                    RawWidth::U32 => u64::from(u32::from_le_bytes(le(src))),
                };
                SensorValue::Float(packed as f64 / scale + bias)
            }
        }
    }

    /// Narrow to `f32`. Finite values past `f32::MAX` are rejected rather
    /// than saturated to infinity; NaN and infinities pass through.
    fn single(self, field: &SensorField) -> Result<f32> {
        let wide = self.as_f64();
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(out_of_range(field, self));
        }
        Ok(wide as f32)
    }

    fn unsigned<T: TryFrom<u64>>(self, field: &SensorField) -> Result<T> {
        let wide = match self {
            SensorValue::Unsigned(v) => Some(v),
            SensorValue::Signed(v) => u64::try_from(v).ok(),
            SensorValue::Float(_) => return Err(mismatch(field)),
        };
        wide.and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| out_of_range(field, self))
    }

    fn signed<T: TryFrom<i64>>(self, field: &SensorField) -> Result<T> {
        let wide = match self {
            SensorValue::Unsigned(v) => i64::try_from(v).ok(),
            SensorValue::Signed(v) => Some(v),
            SensorValue::Float(_) => return Err(mismatch(field)),
        };
        wide.and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| out_of_range(field, self))
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Unsigned(v) => write!(f, "{v}"),
            SensorValue::Signed(v) => write!(f, "{v}"),
            SensorValue::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! from_int {
    ($variant:ident, $wide:ty: $($t:ty),*) => {
        $(impl From<$t> for SensorValue {
            fn from(v: $t) -> Self {
                SensorValue::$variant(<$wide>::from(v))
            }
        })*
    };
}

from_int!(Unsigned, u64: u8, u16, u32, u64);
from_int!(Signed, i64: i8, i16, i32, i64);

impl From<f32> for SensorValue {
    fn from(v: f32) -> Self {
        SensorValue::Float(f64::from(v))
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        SensorValue::Float(v)
    }
}

fn le<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&src[..N]);
    bytes
}

fn overflow(field: &SensorField, source: crate::quantize::QuantizeError) -> FrameError {
    FrameError::Overflow {
        field: field.name().to_string(),
        source,
    }
}

fn mismatch(field: &SensorField) -> FrameError {
    FrameError::KindMismatch {
        field: field.name().to_string(),
        kind: field.kind().label(),
    }
}

fn out_of_range(field: &SensorField, value: SensorValue) -> FrameError {
    FrameError::ValueOutOfRange {
        field: field.name().to_string(),
        value: value.to_string(),
        kind: field.kind().label(),
    }
}
