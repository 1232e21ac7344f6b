//! Shared sensor registry for telelink frames.
//!
//! A [`Schema`] is the single definition of which sensor fields exist, their
//! wire sizes and their update-rate [`Tier`]. Both ends of the link must be
//! built from the same schema: the frame carries no field metadata, so any
//! layout disagreement silently corrupts decoding.
//!
//! Schemas come from the builder, from a JSON definition document, or from
//! the built-in variants.

pub mod config;
pub mod definition;
pub mod error;
pub mod field;
pub mod registry;
pub mod tier;
pub mod variants;

pub use config::RegistryConfig;
pub use definition::{FieldDefinition, SchemaDefinition};
pub use error::{Result, SchemaError};
pub use field::{FieldKind, RawWidth, SensorField};
pub use registry::{Schema, SchemaBuilder};
pub use tier::{Tier, CONDITIONAL_SHIFT, HEADER_SIZE, MAX_EVENT, TIER_COUNT};
pub use variants::VARIANT_NAMES;
