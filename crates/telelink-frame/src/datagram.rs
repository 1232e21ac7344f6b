use std::sync::Arc;

use bytes::BytesMut;
use telelink_schema::Schema;
use tokio_util::codec::Decoder;
use tracing::warn;

use crate::codec::{decode_frame, DecodedFrame, FrameConfig};
use crate::error::FrameError;

/// Receive-side codec for datagram transports such as
/// `tokio_util::udp::UdpFramed`.
///
/// Each datagram is one frame, so every call consumes the whole buffer.
#[derive(Debug, Clone)]
pub struct DatagramCodec {
    schema: Arc<Schema>,
    config: FrameConfig,
}

impl DatagramCodec {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_config(schema, FrameConfig::default())
    }

    pub fn with_config(schema: Arc<Schema>, config: FrameConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl Decoder for DatagramCodec {
    type Item = DecodedFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let datagram = src.split_to(src.len());
        decode_frame(&self.schema, &datagram, &self.config)
            .map(Some)
            .inspect_err(|err| warn!(len = datagram.len(), error = %err, "dropping datagram"))
    }
}
