//! Message-code framing of prioritized sensor tiers.
//!
//! A frame is a 2-byte little-endian [`MessageCode`] followed by the packed
//! bytes of every tier the code flags, in priority order:
//!
//! ```text
//! ┌────────────┬────────────┬──────────────┬────────────┬─────────────────────┐
//! │ Code (2B)  │ Fast       │ Medium       │ Slow       │ Conditional payloads│
//! │ LE bitmask │ if bit 0   │ if bit 1     │ if bit 2   │ per event bit 3..15 │
//! └────────────┴────────────┴──────────────┴────────────┴─────────────────────┘
//! ```
//!
//! There is no length field: the frame length follows from the code and the
//! shared [`Schema`](telelink_schema::Schema), and receivers check it before
//! touching their store.

pub mod code;
pub mod codec;
pub mod error;
pub mod quantize;
pub mod reader;
pub mod store;
pub mod value;
pub mod writer;

#[cfg(feature = "async")]
pub mod datagram;

pub use code::{compute_message_code, DirtyFlags, MessageCode};
pub use codec::{
    decode_frame, deserialize, deserialize_with_config, expected_frame_len, serialize,
    serialize_into, DecodedFrame, FrameConfig, DEFAULT_MAX_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use quantize::{QuantizeError, Quantizer};
pub use reader::FrameReader;
pub use store::{Accessor, SensorStore};
pub use telelink_schema::HEADER_SIZE;
pub use value::SensorValue;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use datagram::DatagramCodec;
