use std::fmt;
use std::fs::{self, File, Metadata};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::field::FieldKind;
use crate::registry::Schema;
use crate::tier::Tier;

/// JSON Schema every definition document must satisfy.
pub const DEFINITION_FORMAT: &str = include_str!("../definitions/schema-definition.schema.json");

/// Serializable form of a schema, as stored in definition files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// One field entry of a [`SchemaDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<u8>,
    pub kind: FieldKind,
}

impl SchemaDefinition {
    /// Freeze the definition into a validated [`Schema`].
    pub fn into_schema(self, config: &RegistryConfig) -> Result<Schema> {
        let mut builder = Schema::builder(self.name);
        for field in self.fields {
            builder = match (field.tier, field.event) {
                (Tier::Conditional, Some(event)) => {
                    builder.conditional(field.name, event, field.kind)
                }
                (Tier::Conditional, None) => {
                    return Err(SchemaError::InvalidEvent {
                        field: field.name,
                        event: None,
                        max: crate::tier::MAX_EVENT,
                    })
                }
                (tier, None) => builder.field(field.name, tier, field.kind),
                (_, Some(event)) => {
                    return Err(SchemaError::InvalidEvent {
                        field: field.name,
                        event: Some(event),
                        max: crate::tier::MAX_EVENT,
                    })
                }
            };
        }
        builder.build_with_config(config)
    }
}

impl From<&Schema> for SchemaDefinition {
    fn from(schema: &Schema) -> Self {
        Self {
            name: schema.name().to_string(),
            fields: schema
                .all_fields_in_priority_order()
                .iter()
                .map(|field| FieldDefinition {
                    name: field.name().to_string(),
                    tier: field.tier(),
                    event: field.event(),
                    kind: field.kind(),
                })
                .collect(),
        }
    }
}

impl Schema {
    /// Parse, validate and build a schema from a JSON definition string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_config(json, &RegistryConfig::default())
    }

    /// Parse, validate and build with explicit limits.
    pub fn from_json_str_with_config(json: &str, config: &RegistryConfig) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        validate_definition(&value)?;
        let definition: SchemaDefinition = serde_json::from_value(value)?;
        definition.into_schema(config)
    }

    /// Load a schema definition file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, &RegistryConfig::default())
    }

    /// Load a schema definition file with explicit limits.
    ///
    /// Symlinks and files larger than `max_schema_file_size` are refused.
    pub fn from_file_with_config(path: &Path, config: &RegistryConfig) -> Result<Self> {
        let text = read_definition(path, config.max_schema_file_size)?;
        let schema = Self::from_json_str_with_config(&text, config)?;
        info!(path = %path.display(), schema = %schema.name(), "schema loaded");
        Ok(schema)
    }

    /// Serialize back into a definition document.
    pub fn to_definition(&self) -> SchemaDefinition {
        SchemaDefinition::from(self)
    }
}

fn validate_definition(value: &Value) -> Result<()> {
    let format: Value = serde_json::from_str(DEFINITION_FORMAT)?;
    let validator = jsonschema::validator_for(&format)
        .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;

    let mut errors = validator.iter_errors(value);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(3) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::ValidationFailed(message));
    }
    Ok(())
}

/// Read a definition document of at most `limit` bytes.
///
/// Only a regular file is read, and it must still be the same file once
/// opened. The limit is checked against the opened file's length and again
/// against what was actually read.
fn read_definition(path: &Path, limit: usize) -> Result<String> {
    let fail = |what: &dyn fmt::Display| SchemaError::LoadFailed(format!("{}: {what}", path.display()));

    let listed = fs::symlink_metadata(path).map_err(|err| fail(&err))?;
    if listed.file_type().is_symlink() {
        return Err(fail(&"definition is a symlink"));
    }
    if !listed.is_file() {
        return Err(fail(&"definition is not a regular file"));
    }

    let file = File::open(path).map_err(|err| fail(&err))?;
    let opened = file.metadata().map_err(|err| fail(&err))?;
    if !same_inode(&listed, &opened) {
        return Err(fail(&"definition replaced while opening"));
    }
    let cap = limit as u64;
    if opened.len() > cap {
        return Err(fail(&format!("{} bytes exceeds the {limit} byte limit", opened.len())));
    }

    let mut text = String::new();
    file.take(cap.saturating_add(1))
        .read_to_string(&mut text)
        .map_err(|err| fail(&err))?;
    if text.len() > limit {
        return Err(fail(&format!("grew past the {limit} byte limit")));
    }
    Ok(text)
}

#[cfg(unix)]
fn same_inode(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    (a.dev(), a.ino()) == (b.dev(), b.ino())
}

#[cfg(not(unix))]
fn same_inode(_: &Metadata, _: &Metadata) -> bool {
    true
}
