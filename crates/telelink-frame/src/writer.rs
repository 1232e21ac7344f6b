use bytes::BytesMut;
use telelink_transport::{Link, TransportError};
use tracing::debug;

use crate::code::{compute_message_code, DirtyFlags, MessageCode};
use crate::codec::{serialize_into, FrameConfig};
use crate::error::Result;
use crate::store::SensorStore;

/// Builds frames from a [`SensorStore`] and sends them over a [`Link`].
pub struct FrameWriter<L> {
    inner: L,
    buf: BytesMut,
    config: FrameConfig,
}

impl<L: Link> FrameWriter<L> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: L) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: L, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.max_frame_size),
            config,
        }
    }

    /// Serialize and send the frame `code` selects.
    ///
    /// Returns the number of bytes sent. An empty code sends nothing and
    /// returns zero.
    pub fn send(&mut self, code: MessageCode, store: &SensorStore) -> Result<usize> {
        self.buf.clear();
        let len = serialize_into(code, store, &mut self.buf)?;
        if len == 0 {
            return Ok(0);
        }

        let max = self.config.max_frame_size.min(self.inner.max_frame_size());
        if len > max {
            return Err(TransportError::FrameTooLarge { size: len, max }.into());
        }

        self.inner.send(&self.buf)?;
        debug!(code = %code, len, "frame sent");
        Ok(len)
    }

    /// Drain `flags` into a code and send the resulting frame.
    pub fn send_dirty(&mut self, flags: &mut DirtyFlags, store: &SensorStore) -> Result<usize> {
        let code = compute_message_code(flags);
        self.send(code, store)
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the writer and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
