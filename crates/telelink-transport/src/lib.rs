//! Datagram link abstraction for the telelink radio channel.
//!
//! The radio is modelled as a best-effort, byte-oriented datagram channel
//! with a known maximum frame size:
//! - [`LoopbackLink`] pairs for in-process testing
//! - [`UdpLink`] for base-station bench setups where UDP stands in for LoRa
//!
//! No sequencing, acknowledgement or retransmission happens at this layer.

pub mod error;
pub mod link;
pub mod loopback;
pub mod udp;

#[cfg(feature = "async")]
pub mod tokio_udp;

pub use error::{Result, TransportError};
pub use link::{Link, RFM95_MAX_MESSAGE_LEN};
pub use loopback::LoopbackLink;
pub use udp::UdpLink;

#[cfg(feature = "async")]
pub use tokio_udp::AsyncUdpLink;
