use telelink_schema::Schema;
use telelink_transport::Link;
use tracing::warn;

use crate::code::MessageCode;
use crate::codec::{decode_frame, DecodedFrame, FrameConfig};
use crate::error::Result;
use crate::store::SensorStore;

/// Receives frames from a [`Link`] and decodes them against a schema.
///
/// Rejected frames are logged and returned as errors; the caller's store is
/// never partially updated.
pub struct FrameReader<L> {
    inner: L,
    buf: Vec<u8>,
    config: FrameConfig,
}

impl<L: Link> FrameReader<L> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: L) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: L, config: FrameConfig) -> Self {
        // One spare byte so an oversized datagram is seen whole enough to reject.
        let capacity = config.max_frame_size.max(inner.max_frame_size()) + 1;
        Self {
            inner,
            buf: vec![0u8; capacity],
            config,
        }
    }

    /// Receive one frame, if any is waiting, without applying it.
    pub fn receive_frame(&mut self, schema: &Schema) -> Result<Option<DecodedFrame>> {
        let Some(len) = self.inner.receive(&mut self.buf)? else {
            return Ok(None);
        };
        match decode_frame(schema, &self.buf[..len], &self.config) {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => {
                warn!(len, error = %err, "dropping frame");
                Err(err)
            }
        }
    }

    /// Receive one frame, if any is waiting, and apply it to `store`.
    pub fn poll(&mut self, store: &mut SensorStore) -> Result<Option<MessageCode>> {
        let schema = store.schema().clone();
        match self.receive_frame(&schema)? {
            Some(frame) => {
                frame.apply(store);
                Ok(Some(frame.code))
            }
            None => Ok(None),
        }
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the reader and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use telelink_transport::LoopbackLink;

    use super::*;
    use crate::error::FrameError;
    use crate::value::SensorValue;

    fn store() -> SensorStore {
        SensorStore::new(Arc::new(Schema::scenario().unwrap()))
    }

    #[test]
    fn applies_received_frame() {
        let (mut tx, rx) = LoopbackLink::pair();
        let mut reader = FrameReader::new(rx);
        let mut store = store();

        tx.send(&[0x04, 0x00, 0x2C, 0x01]).unwrap();
        let code = reader.poll(&mut store).unwrap().unwrap();
        assert_eq!(code.bits(), 0b100);
        assert_eq!(store.get_by_name("s").unwrap(), SensorValue::Unsigned(300));
        assert!(reader.poll(&mut store).unwrap().is_none());
    }

    #[test]
    fn truncated_frame_dropped_and_reader_continues() {
        let (mut tx, rx) = LoopbackLink::pair();
        let mut reader = FrameReader::new(rx);
        let mut store = store();

        tx.send(&[0x01, 0x00, 0x01]).unwrap();
        tx.send(&[0x04, 0x00, 0x05, 0x00]).unwrap();

        assert!(matches!(
            reader.poll(&mut store),
            Err(FrameError::TruncatedFrame {
                expected: 6,
                actual: 3
            })
        ));
        assert_eq!(store.get_by_name("a").unwrap(), SensorValue::Unsigned(0));

        reader.poll(&mut store).unwrap();
        assert_eq!(store.get_by_name("s").unwrap(), SensorValue::Unsigned(5));
    }
}
