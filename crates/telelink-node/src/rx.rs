use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Map, Value};
use telelink_frame::{decode_frame, FrameConfig, FrameReader, MessageCode, SensorStore, SensorValue};
use telelink_schema::{Schema, Tier};
use telelink_transport::Link;
use tracing::{debug, warn};

use crate::error::{NodeError, Result};
use crate::json::value_to_json;

/// Frame counters of a receive node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RxStats {
    pub received: u64,
    pub dropped: u64,
}

/// Receive-side node context.
///
/// Holds the last known value of every field. Frames are validated in full
/// before the store is touched; a rejected frame is counted, logged and
/// otherwise ignored.
pub struct RxNode {
    schema: Arc<Schema>,
    store: Mutex<SensorStore>,
    config: FrameConfig,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl RxNode {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_config(schema, FrameConfig::default())
    }

    pub fn with_config(schema: Arc<Schema>, config: FrameConfig) -> Self {
        Self {
            store: Mutex::new(SensorStore::new(Arc::clone(&schema))),
            schema,
            config,
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Validate one frame and apply it.
    pub fn apply(&self, frame: &[u8]) -> Result<MessageCode> {
        match decode_frame(&self.schema, frame, &self.config) {
            Ok(decoded) => {
                decoded.apply(&mut *self.lock()?);
                self.received.fetch_add(1, Ordering::Relaxed);
                debug!(code = %decoded.code, len = frame.len(), "frame applied");
                Ok(decoded.code)
            }
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(len = frame.len(), error = %err, "dropping frame");
                Err(err.into())
            }
        }
    }

    /// Receive and apply one frame from `reader`, if one is waiting.
    pub fn receive<L: Link>(&self, reader: &mut FrameReader<L>) -> Result<Option<MessageCode>> {
        match reader.receive_frame(&self.schema) {
            Ok(Some(decoded)) => {
                decoded.apply(&mut *self.lock()?);
                self.received.fetch_add(1, Ordering::Relaxed);
                Ok(Some(decoded.code))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(err.into())
            }
        }
    }

    /// Last known value of a field.
    pub fn get(&self, name: &str) -> Result<SensorValue> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| NodeError::UnknownField(name.to_string()))?;
        Ok(self.lock()?.get(index)?)
    }

    pub fn stats(&self) -> RxStats {
        RxStats {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Display snapshot: one JSON object per tier, keyed by field name.
    ///
    /// Quantized fields appear as their decoded floats.
    pub fn snapshot(&self) -> Result<Value> {
        let store = self.lock()?;
        snapshot_of(&store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SensorStore>> {
        self.store.lock().map_err(|_| NodeError::LockPoisoned)
    }
}

/// Tier-grouped JSON view of a store.
fn snapshot_of(store: &SensorStore) -> Result<Value> {
    let schema = store.schema();
    let mut root = Map::new();
    for tier in Tier::ALL {
        let mut fields = Map::new();
        for index in schema.span(tier) {
            if let Some(field) = schema.field(index) {
                fields.insert(field.name().to_string(), value_to_json(store.get(index)?));
            }
        }
        root.insert(tier.as_str().to_string(), Value::Object(fields));
    }
    Ok(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use telelink_frame::{FrameError, FrameWriter};
    use telelink_transport::LoopbackLink;

    use super::*;

    fn node() -> RxNode {
        RxNode::new(Arc::new(Schema::scenario().unwrap()))
    }

    #[test]
    fn applies_scenario_frame() {
        let node = node();
        let code = node
            .apply(&[0x11, 0x00, 0x64, 0x00, 0xC8, 0x00, 0x07])
            .unwrap();
        assert_eq!(code.bits(), 0b10001);
        assert_eq!(node.get("b").unwrap(), SensorValue::Unsigned(200));
        assert_eq!(
            node.snapshot().unwrap(),
            json!({
                "fast": { "a": 100, "b": 200 },
                "medium": {},
                "slow": { "s": 0 },
                "conditional": { "c": 7 },
            })
        );
    }

    #[test]
    fn rejected_frames_counted_and_ignored() {
        let node = node();
        node.apply(&[0x04, 0x00, 0x09, 0x00]).unwrap();

        let err = node.apply(&[0x05, 0x00, 0x01, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            NodeError::Frame(FrameError::TruncatedFrame { .. })
        ));
        assert_eq!(node.get("s").unwrap(), SensorValue::Unsigned(9));
        assert_eq!(node.get("a").unwrap(), SensorValue::Unsigned(0));
        assert_eq!(
            node.stats(),
            RxStats {
                received: 1,
                dropped: 1
            }
        );
    }

    #[test]
    fn quantized_fields_snapshot_as_floats() {
        let node = RxNode::new(Arc::new(Schema::wheels().unwrap()));
        let mut frame = vec![0x01, 0x00];
        // fl wheel speed 12.5 -> 125, fl brake temperature 60.0 -> 1000.
        frame.extend_from_slice(&125u16.to_le_bytes());
        frame.extend_from_slice(&1000u16.to_le_bytes());
        frame.extend_from_slice(&[0u8; 18]);
        node.apply(&frame).unwrap();

        let snapshot = node.snapshot().unwrap();
        assert_eq!(snapshot["fast"]["fl_wheel_speed"], json!(12.5));
        assert_eq!(snapshot["fast"]["fl_brake_temperature"], json!(60.0));
        assert_eq!(snapshot["fast"]["fr_brake_temperature"], json!(-40.0));
    }

    #[test]
    fn receives_through_reader() {
        let node = node();
        let (tx, rx) = LoopbackLink::pair();
        let mut writer = FrameWriter::new(tx);
        let mut reader = FrameReader::new(rx);

        let mut store = SensorStore::new(Arc::clone(node.schema()));
        store.set_by_name("s", 42u16).unwrap();
        writer
            .send(MessageCode::from_bits(0b100), &store)
            .unwrap();

        let code = node.receive(&mut reader).unwrap().unwrap();
        assert_eq!(code.bits(), 0b100);
        assert_eq!(node.get("s").unwrap(), SensorValue::Unsigned(42));
        assert!(node.receive(&mut reader).unwrap().is_none());
    }
}
