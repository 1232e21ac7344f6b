//! Prioritized sensor telemetry framing for bandwidth-limited radio links.
//!
//! telelink packs a variable, prioritized subset of vehicle sensor fields
//! into compact frames tagged by a bitmask message code, and rebuilds the
//! receiver's view of those fields from the frames that arrive.
//!
//! # Crate Structure
//!
//! - [`transport`]: Datagram link abstraction (loopback, UDP)
//! - [`schema`]: Shared field layout: tiers, kinds, definition files
//! - [`frame`]: Message codes, frame serialization, sensor store, quantization
//! - [`node`]: Transmit and receive node contexts (behind `node` feature)

/// Re-export transport types.
pub mod transport {
    pub use telelink_transport::*;
}

/// Re-export schema types.
pub mod schema {
    pub use telelink_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use telelink_frame::*;
}

/// Re-export node types (requires `node` feature).
#[cfg(feature = "node")]
pub mod node {
    pub use telelink_node::*;
}
