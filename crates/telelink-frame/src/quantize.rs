//! Fixed-point packing of float sensor values.
//!
//! `raw = round((value - bias) * scale)` and `value = raw / scale + bias`.
//! Rounding is half away from zero on the exact product. Results that do
//! not fit the unsigned wire width (negative, too large, NaN) are errors
//! rather than wrapped values; picking a scale and bias that keep typical
//! readings in range is up to the schema author.

use telelink_schema::RawWidth;

/// Errors from the quantization primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuantizeError {
    /// The scaled value does not fit the target width.
    #[error("value {value} outside quantizable range {min}..={max}")]
    Overflow { value: f64, min: f64, max: f64 },

    /// Scale must be finite and positive, bias finite.
    #[error("invalid quantizer (scale {scale}, bias {bias})")]
    InvalidScale { scale: f64, bias: f64 },
}

/// Scale and bias pair for one quantized field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    scale: f64,
    bias: f64,
}

impl Quantizer {
    pub fn new(scale: f64, bias: f64) -> Result<Self, QuantizeError> {
        if !(scale.is_finite() && scale > 0.0 && bias.is_finite()) {
            return Err(QuantizeError::InvalidScale { scale, bias });
        }
        Ok(Self { scale, bias })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Size of one quantization step in value units.
    pub fn step(&self) -> f64 {
        1.0 / self.scale
    }

    /// Smallest and largest value representable in `width`.
    pub fn range(&self, width: RawWidth) -> (f64, f64) {
        (self.bias, self.decode(width.max_raw()))
    }

    pub fn encode(&self, value: f64, width: RawWidth) -> Result<u64, QuantizeError> {
        let scaled = ((value - self.bias) * self.scale).round();
        let max = width.max_raw();
        if !(scaled >= 0.0 && scaled <= max as f64) {
            let (min, max) = self.range(width);
            return Err(QuantizeError::Overflow { value, min, max });
        }
        Ok(scaled as u64)
    }

    pub fn decode(&self, raw: u64) -> f64 {
        raw as f64 / self.scale + self.bias
    }
}

/// One-shot form of [`Quantizer::encode`].
pub fn encode(value: f64, scale: f64, bias: f64, width: RawWidth) -> Result<u64, QuantizeError> {
    Quantizer::new(scale, bias)?.encode(value, width)
}

/// One-shot form of [`Quantizer::decode`].
pub fn decode(raw: u64, scale: f64, bias: f64) -> Result<f64, QuantizeError> {
    Ok(Quantizer::new(scale, bias)?.decode(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brake_temperature_round_trip() {
        let q = Quantizer::new(10.0, -40.0).unwrap();
        let raw = q.encode(85.27, RawWidth::U16).unwrap();
        assert_eq!(raw, 1253);
        let back = q.decode(raw);
        assert!((back - 85.27).abs() <= q.step());
    }

    #[test]
    fn within_one_step_across_range() {
        let q = Quantizer::new(10.0, 0.0).unwrap();
        let mut v = 0.0;
        while v < 6_000.0 {
            let back = q.decode(q.encode(v, RawWidth::U16).unwrap());
            assert!((back - v).abs() <= q.step(), "{v} -> {back}");
            v += 13.37;
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let q = Quantizer::new(1.0, 0.0).unwrap();
        assert_eq!(q.encode(2.5, RawWidth::U8).unwrap(), 3);
        assert_eq!(q.encode(2.49, RawWidth::U8).unwrap(), 2);
    }

    #[test]
    fn below_bias_is_overflow_not_wrap() {
        let q = Quantizer::new(10.0, -40.0).unwrap();
        assert!(matches!(
            q.encode(-41.0, RawWidth::U16),
            Err(QuantizeError::Overflow { .. })
        ));
        // Half a step below the bias still rounds to zero.
        assert_eq!(q.encode(-40.04, RawWidth::U16).unwrap(), 0);
    }

    #[test]
    fn above_width_is_overflow() {
        let q = Quantizer::new(10.0, 0.0).unwrap();
        assert_eq!(q.encode(25.5, RawWidth::U8).unwrap(), 255);
        assert!(matches!(
            q.encode(25.6, RawWidth::U8),
            Err(QuantizeError::Overflow { .. })
        ));
        assert!(q.encode(f64::NAN, RawWidth::U32).is_err());
        assert!(q.encode(f64::INFINITY, RawWidth::U32).is_err());
    }

    #[test]
    fn invalid_scale_rejected() {
        assert!(Quantizer::new(0.0, 0.0).is_err());
        assert!(Quantizer::new(-1.0, 0.0).is_err());
        assert!(Quantizer::new(f64::NAN, 0.0).is_err());
        assert!(Quantizer::new(1.0, f64::INFINITY).is_err());
        assert!(encode(1.0, 0.0, 0.0, RawWidth::U8).is_err());
    }

    #[test]
    fn free_functions_match_quantizer() {
        assert_eq!(encode(12.3, 10.0, 0.0, RawWidth::U16).unwrap(), 123);
        let v = decode(123, 10.0, 0.0).unwrap();
        assert!((v - 12.3).abs() < 1e-9);
    }

    #[test]
    fn range_reports_bounds() {
        let q = Quantizer::new(10.0, -40.0).unwrap();
        let (min, max) = q.range(RawWidth::U16);
        assert_eq!(min, -40.0);
        assert!((max - 6513.5).abs() < 1e-9);
    }
}
