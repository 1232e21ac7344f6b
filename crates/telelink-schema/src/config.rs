/// Limits applied while building and loading schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Largest frame the link carries; a schema whose full frame exceeds it is rejected.
    pub max_frame_size: usize,
    /// Maximum number of fields in one schema.
    pub max_fields: usize,
    /// Maximum bytes allowed for a schema definition file.
    pub max_schema_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 251,
            max_fields: 256,
            max_schema_file_size: 256 * 1024,
        }
    }
}
