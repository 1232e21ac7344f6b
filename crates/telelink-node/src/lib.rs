//! Transmit and receive node contexts.
//!
//! A [`TxNode`] owns the transmit-side sensor store and dirty flags; tick
//! handlers mark tiers dirty and `send` drains them into one frame. An
//! [`RxNode`] owns the receive-side store and applies validated frames to
//! it. Both are `Send + Sync` and meant to be shared through an `Arc`
//! between tick, link and display threads.

pub mod error;
pub mod json;
pub mod rx;
pub mod schedule;
pub mod tx;

pub use error::{NodeError, Result};
pub use json::{value_from_json, value_to_json};
pub use rx::{RxNode, RxStats};
pub use schedule::{Due, TickIntervals, TickSchedule};
pub use tx::{TxNode, PACKET_COUNTER_FIELD};
