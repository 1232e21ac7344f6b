/// Errors that can occur in node operations.
///
/// A failed frame never takes the node down: the frame is dropped and the
/// next tick proceeds as usual.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] telelink_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] telelink_transport::TransportError),

    /// Schema construction or loading error.
    #[error("schema error: {0}")]
    Schema(#[from] telelink_schema::SchemaError),

    /// No field with this name in the node's schema.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Conditional event index outside the code's event range.
    #[error("event {event} out of range (max {max})")]
    InvalidEvent { event: u8, max: u8 },

    /// The packet counter field must be an unsigned integer.
    #[error("field {0} cannot be used as a packet counter")]
    InvalidCounter(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another thread panicked while holding the node state.
    #[error("node state lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, NodeError>;
