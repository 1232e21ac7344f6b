use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::link::{Link, RFM95_MAX_MESSAGE_LEN};

type Queue = Arc<Mutex<VecDeque<Bytes>>>;

/// In-process datagram link.
///
/// Created in connected pairs: frames sent on one end are received on the
/// other, in order. Used for bench tests and for wiring a transmitter node
/// straight into a receiver node.
#[derive(Debug)]
pub struct LoopbackLink {
    outbound: Queue,
    inbound: Queue,
    max_frame_size: usize,
}

impl LoopbackLink {
    /// Create a connected pair sized like the LoRa radio.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_max(RFM95_MAX_MESSAGE_LEN)
    }

    /// Create a connected pair with an explicit maximum frame size.
    pub fn pair_with_max(max_frame_size: usize) -> (Self, Self) {
        let a_to_b: Queue = Arc::default();
        let b_to_a: Queue = Arc::default();

        let a = Self {
            outbound: Arc::clone(&a_to_b),
            inbound: Arc::clone(&b_to_a),
            max_frame_size,
        };
        let b = Self {
            outbound: b_to_a,
            inbound: a_to_b,
            max_frame_size,
        };
        (a, b)
    }

    /// Number of frames waiting to be received on this end.
    pub fn pending(&self) -> usize {
        self.inbound.lock().map(|queue| queue.len()).unwrap_or(0)
    }
}

impl Link for LoopbackLink {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }

        let mut queue = self
            .outbound
            .lock()
            .map_err(|_| TransportError::Disconnected)?;
        queue.push_back(Bytes::copy_from_slice(frame));
        debug!(len = frame.len(), "loopback frame queued");
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let frame = {
            let mut queue = self
                .inbound
                .lock()
                .map_err(|_| TransportError::Disconnected)?;
            match queue.pop_front() {
                Some(frame) => frame,
                None => return Ok(None),
            }
        };

        let len = frame.len().min(buf.len());
        if len < frame.len() {
            debug!(
                len = frame.len(),
                capacity = buf.len(),
                "loopback frame truncated"
            );
        }
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(Some(len))
    }

    fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}
