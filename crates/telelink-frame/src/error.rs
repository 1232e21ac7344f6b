use crate::quantize::QuantizeError;

/// Errors that can occur while building or reading a frame.
///
/// None of these are fatal: the frame in flight is dropped and the node
/// carries on with the next tick. Schema disagreement between the two ends
/// cannot be detected here; it is prevented by building both from one
/// [`Schema`](telelink_schema::Schema).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The destination buffer cannot hold the frame the code calls for.
    #[error("buffer too small ({capacity} bytes, frame needs {needed})")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// The received frame is shorter than its own code implies.
    #[error("truncated frame ({actual} bytes, code implies {expected})")]
    TruncatedFrame { expected: usize, actual: usize },

    /// The received frame exceeds the configured maximum frame size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The received frame is longer than its own code implies.
    #[error("frame has trailing bytes ({actual} bytes, code implies {expected})")]
    TrailingBytes { expected: usize, actual: usize },

    /// A float field does not fit its quantized wire width.
    #[error("field {field}: {source}")]
    Overflow {
        field: String,
        #[source]
        source: QuantizeError,
    },

    /// A value does not fit its field's width, signedness or float range.
    #[error("field {field}: value {value} out of range for {kind}")]
    ValueOutOfRange {
        field: String,
        value: String,
        kind: &'static str,
    },

    /// A float value was given for an integer field.
    #[error("field {field}: expected an integer for {kind}")]
    KindMismatch { field: String, kind: &'static str },

    /// No field with this name or index in the schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Link-level error while sending or receiving.
    #[error("link error: {0}")]
    Transport(#[from] telelink_transport::TransportError),

    /// An I/O error surfaced by an async datagram stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
