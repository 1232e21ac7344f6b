/// Errors raised while building or loading a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema definition file could not be loaded.
    #[error("failed to load schema definition: {0}")]
    LoadFailed(String),

    /// The definition document is not valid JSON.
    #[error("schema definition is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The definition document does not match the definition format.
    #[error("schema definition rejected: {0}")]
    ValidationFailed(String),

    /// The built-in definition format could not be compiled.
    #[error("failed to compile definition format: {0}")]
    CompileFailed(String),

    /// Two fields share a name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// A field name is empty.
    #[error("field name must not be empty")]
    EmptyFieldName,

    /// A conditional field is missing its event index, or it is out of range.
    #[error("field {field}: invalid conditional event {event:?} (expected 0..={max})")]
    InvalidEvent {
        field: String,
        event: Option<u8>,
        max: u8,
    },

    /// Conditional fields must be declared in strictly ascending event order.
    #[error("field {field}: event {event} declared after event {previous}")]
    EventOrder {
        field: String,
        event: u8,
        previous: u8,
    },

    /// A quantized field has an unusable scale or bias.
    #[error("field {field}: invalid quantizer (scale {scale}, bias {bias})")]
    InvalidQuantizer { field: String, scale: f64, bias: f64 },

    /// A frame with every tier present would not fit the link.
    #[error("largest frame is {size} bytes, link max is {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// More fields than the registry config allows.
    #[error("schema has {count} fields, max {max}")]
    TooManyFields { count: usize, max: usize },

    /// No built-in variant with this name.
    #[error("unknown schema variant: {0}")]
    UnknownVariant(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
