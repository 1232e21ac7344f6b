use bytes::{BufMut, BytesMut};
use telelink_schema::{Schema, Tier, HEADER_SIZE, MAX_EVENT};
use tracing::debug;

use crate::code::MessageCode;
use crate::error::{FrameError, Result};
use crate::store::SensorStore;
use crate::value::SensorValue;

/// Default maximum frame size in bytes (RFM95 payload limit).
pub const DEFAULT_MAX_FRAME_SIZE: usize = telelink_transport::RFM95_MAX_MESSAGE_LEN;

/// Frame handling limits shared by writers and readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Largest frame a writer will emit and a reader will accept.
    pub max_frame_size: usize,
    /// Reject received frames longer than their code implies.
    pub reject_trailing_bytes: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            reject_trailing_bytes: true,
        }
    }
}

/// A validated received frame: its code and the field values it carried,
/// keyed by schema index in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub code: MessageCode,
    pub updates: Vec<(usize, SensorValue)>,
}

impl DecodedFrame {
    /// Write every carried value into `store`.
    pub fn apply(&self, store: &mut SensorStore) {
        for &(index, value) in &self.updates {
            store.put_decoded(index, value);
        }
    }
}

/// Length of the frame `code` calls for under `schema`, header included.
///
/// An empty code has length zero: it is never put on the wire.
pub fn expected_frame_len(schema: &Schema, code: MessageCode) -> usize {
    if code.is_empty() {
        return 0;
    }
    HEADER_SIZE + carried_fields(schema, code).map(|index| field_size(schema, index)).sum::<usize>()
}

/// Pack the fields `code` selects from `store` into `dst`.
///
/// Returns the number of bytes written; zero for an empty code, in which
/// case nothing should be sent. On error the contents of `dst` are
/// unspecified and the frame should be dropped.
pub fn serialize(code: MessageCode, store: &SensorStore, dst: &mut [u8]) -> Result<usize> {
    if code.is_empty() {
        return Ok(0);
    }
    let schema = store.schema();
    let needed = expected_frame_len(schema, code);
    if dst.len() < needed {
        return Err(FrameError::BufferTooSmall {
            needed,
            capacity: dst.len(),
        });
    }

    dst[..HEADER_SIZE].copy_from_slice(&code.to_le_bytes());
    let mut offset = HEADER_SIZE;
    for index in carried_fields(schema, code) {
        let Some(field) = schema.field(index) else {
            continue;
        };
        let end = offset + field.size();
        store.get(index)?.encode(field, &mut dst[offset..end])?;
        offset = end;
    }

    debug!(code = %code, len = offset, "frame serialized");
    Ok(offset)
}

/// [`serialize`] into a growable buffer. Nothing is appended for an empty
/// code or on error.
pub fn serialize_into(code: MessageCode, store: &SensorStore, dst: &mut BytesMut) -> Result<usize> {
    let len = expected_frame_len(store.schema(), code);
    if len == 0 {
        return Ok(0);
    }
    let start = dst.len();
    dst.put_bytes(0, len);
    match serialize(code, store, &mut dst[start..]) {
        Ok(written) => Ok(written),
        Err(err) => {
            dst.truncate(start);
            Err(err)
        }
    }
}

/// Validate `src` against `schema` and decode the values it carries.
///
/// Length is checked before anything is decoded, so a rejected frame
/// yields no updates at all.
pub fn decode_frame(schema: &Schema, src: &[u8], config: &FrameConfig) -> Result<DecodedFrame> {
    if src.len() > config.max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: src.len(),
            max: config.max_frame_size,
        });
    }
    if src.len() < HEADER_SIZE {
        return Err(FrameError::TruncatedFrame {
            expected: HEADER_SIZE,
            actual: src.len(),
        });
    }
    let code = MessageCode::from_le_bytes([src[0], src[1]]);
    let expected = expected_frame_len(schema, code).max(HEADER_SIZE);
    if src.len() < expected {
        return Err(FrameError::TruncatedFrame {
            expected,
            actual: src.len(),
        });
    }
    if src.len() > expected && config.reject_trailing_bytes {
        return Err(FrameError::TrailingBytes {
            expected,
            actual: src.len(),
        });
    }

    let mut updates = Vec::new();
    let mut offset = HEADER_SIZE;
    for index in carried_fields(schema, code) {
        let Some(field) = schema.field(index) else {
            continue;
        };
        let end = offset + field.size();
        updates.push((index, SensorValue::decode(field.kind(), &src[offset..end])));
        offset = end;
    }

    debug!(code = %code, len = expected, fields = updates.len(), "frame decoded");
    Ok(DecodedFrame { code, updates })
}

/// Decode `src` and apply it to `store` with default limits.
pub fn deserialize(src: &[u8], store: &mut SensorStore) -> Result<MessageCode> {
    deserialize_with_config(src, store, &FrameConfig::default())
}

/// Decode `src` and apply it to `store`. The store is untouched on error.
pub fn deserialize_with_config(
    src: &[u8],
    store: &mut SensorStore,
    config: &FrameConfig,
) -> Result<MessageCode> {
    let frame = decode_frame(store.schema(), src, config)?;
    frame.apply(store);
    Ok(frame.code)
}

/// Schema indices a frame with `code` carries, in wire order.
fn carried_fields(schema: &Schema, code: MessageCode) -> impl Iterator<Item = usize> + '_ {
    let periodic = Tier::PERIODIC
        .into_iter()
        .filter(move |&tier| code.has_tier(tier))
        .flat_map(move |tier| schema.span(tier));
    let conditional = (0..=MAX_EVENT)
        .filter(move |&event| code.has_event(event))
        .filter_map(move |event| schema.conditional_index(event));
    periodic.chain(conditional)
}

fn field_size(schema: &Schema, index: usize) -> usize {
    schema.field(index).map_or(0, |field| field.size())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use telelink_schema::FieldKind;

    use super::*;

    fn scenario_store() -> SensorStore {
        let mut store = SensorStore::new(Arc::new(Schema::scenario().unwrap()));
        store.set_by_name("a", 100u16).unwrap();
        store.set_by_name("b", 200u16).unwrap();
        store.set_by_name("s", 300u16).unwrap();
        store.set_by_name("c", 7u8).unwrap();
        store
    }

    #[test]
    fn expected_length_sums_flagged_tiers() {
        let schema = Schema::scenario().unwrap();
        assert_eq!(expected_frame_len(&schema, MessageCode::EMPTY), 0);
        assert_eq!(expected_frame_len(&schema, MessageCode::from_bits(0b001)), 6);
        assert_eq!(expected_frame_len(&schema, MessageCode::from_bits(0b100)), 4);
        assert_eq!(expected_frame_len(&schema, MessageCode::from_bits(0b10001)), 7);
        // Medium is empty in this schema; its bit adds nothing.
        assert_eq!(expected_frame_len(&schema, MessageCode::from_bits(0b010)), 2);
        // Event 0 has no bound field: a pure signal.
        assert_eq!(expected_frame_len(&schema, MessageCode::from_bits(0b1000)), 2);
    }

    #[test]
    fn buffer_capacity_checked() {
        let store = scenario_store();
        let mut buf = [0u8; 6];
        let err = serialize(MessageCode::from_bits(0b10001), &store, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferTooSmall {
                needed: 7,
                capacity: 6
            }
        ));
    }

    #[test]
    fn serialize_into_appends() {
        let store = scenario_store();
        let mut buf = BytesMut::from(&b"xx"[..]);
        let n = serialize_into(MessageCode::from_bits(0b100), &store, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..], &[b'x', b'x', 0x04, 0x00, 0x2C, 0x01]);

        assert_eq!(serialize_into(MessageCode::EMPTY, &store, &mut buf).unwrap(), 0);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn failed_serialize_into_leaves_buffer() {
        let schema = Schema::builder("q")
            .fast("v", FieldKind::I16)
            .build()
            .unwrap();
        let mut store = SensorStore::new(Arc::new(schema));
        store
            .link(0, || SensorValue::Signed(i64::from(i32::MAX)))
            .unwrap();
        let mut buf = BytesMut::new();
        let err = serialize_into(MessageCode::from_bits(0b001), &store, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn short_header_is_truncated() {
        let schema = Schema::scenario().unwrap();
        let err = decode_frame(&schema, &[0x01], &FrameConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedFrame {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn trailing_bytes_policy() {
        let schema = Schema::scenario().unwrap();
        let frame = [0x04, 0x00, 0x2C, 0x01, 0xFF];
        assert!(matches!(
            decode_frame(&schema, &frame, &FrameConfig::default()),
            Err(FrameError::TrailingBytes {
                expected: 4,
                actual: 5
            })
        ));

        let lenient = FrameConfig {
            reject_trailing_bytes: false,
            ..FrameConfig::default()
        };
        let decoded = decode_frame(&schema, &frame, &lenient).unwrap();
        assert_eq!(decoded.updates, vec![(2, SensorValue::Unsigned(300))]);
    }

    #[test]
    fn oversized_frame_rejected_before_parsing() {
        let schema = Schema::wheels().unwrap();
        let mut frame = vec![0x01, 0x00];
        frame.extend_from_slice(&[0u8; 22]);
        assert!(decode_frame(&schema, &frame, &FrameConfig::default()).is_ok());

        let tight = FrameConfig {
            max_frame_size: 8,
            ..FrameConfig::default()
        };
        assert!(matches!(
            decode_frame(&schema, &frame, &tight),
            Err(FrameError::FrameTooLarge { size: 24, max: 8 })
        ));

        let mut store = SensorStore::new(Arc::new(schema));
        frame[2] = 0x7D;
        assert!(deserialize_with_config(&frame, &mut store, &tight).is_err());
        assert_eq!(store.get(0).unwrap(), SensorValue::Float(0.0));
    }

    #[test]
    fn header_only_frame_applies_nothing() {
        let mut store = scenario_store();
        let code = deserialize(&[0x00, 0x00], &mut store).unwrap();
        assert!(code.is_empty());
        assert_eq!(store.get_by_name("a").unwrap(), SensorValue::Unsigned(100));
    }
}
