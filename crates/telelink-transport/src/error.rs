use std::net::SocketAddr;

/// Errors that can occur on a telemetry link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to associate the link with its remote peer.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred on the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The outgoing frame exceeds the link's maximum frame size.
    #[error("frame too large for link ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The other end of the link is gone.
    #[error("link disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
