use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::field::{FieldKind, SensorField};
use crate::tier::{Tier, HEADER_SIZE, MAX_EVENT, TIER_COUNT};

/// The shared field layout both ends of the link are built from.
///
/// Fields are stored in canonical priority order: every Fast field, then
/// Medium, then Slow, then Conditional (ascending event). Within a tier the
/// declaration order is kept. A field's position in this order is its index
/// everywhere else (sensor store slots, decoded updates).
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<SensorField>,
    spans: [Range<usize>; TIER_COUNT],
    tier_sizes: [usize; TIER_COUNT],
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total packed byte size of a tier's fields.
    ///
    /// For the conditional tier this is the size with every event present.
    pub fn tier_byte_size(&self, tier: Tier) -> usize {
        self.tier_sizes[tier.index()]
    }

    /// Every field, in canonical priority order.
    pub fn all_fields_in_priority_order(&self) -> &[SensorField] {
        &self.fields
    }

    /// Fields owned by one tier, in wire order.
    pub fn fields_in(&self, tier: Tier) -> &[SensorField] {
        &self.fields[self.span(tier)]
    }

    /// Index range of a tier's fields in priority order.
    pub fn span(&self, tier: Tier) -> Range<usize> {
        self.spans[tier.index()].clone()
    }

    /// Index of the conditional field bound to `event`, if any.
    pub fn conditional_index(&self, event: u8) -> Option<usize> {
        self.span(Tier::Conditional)
            .find(|&index| self.fields[index].event() == Some(event))
    }

    pub fn field(&self, index: usize) -> Option<&SensorField> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Size of a frame carrying every tier and every conditional payload.
    pub fn max_frame_len(&self) -> usize {
        HEADER_SIZE + self.tier_sizes.iter().sum::<usize>()
    }
}

/// Incremental schema construction with validation on [`SchemaBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    pending: Vec<SensorField>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Vec::new(),
        }
    }

    /// Append a field to a periodic tier.
    pub fn field(mut self, name: impl Into<String>, tier: Tier, kind: FieldKind) -> Self {
        self.pending
            .push(SensorField::new(name.into(), tier, kind, None));
        self
    }

    pub fn fast(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, Tier::Fast, kind)
    }

    pub fn medium(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, Tier::Medium, kind)
    }

    pub fn slow(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, Tier::Slow, kind)
    }

    /// Append a conditional field carried whenever `event` fires.
    pub fn conditional(mut self, name: impl Into<String>, event: u8, kind: FieldKind) -> Self {
        self.pending.push(SensorField::new(
            name.into(),
            Tier::Conditional,
            kind,
            Some(event),
        ));
        self
    }

    /// Validate against default limits and freeze the layout.
    pub fn build(self) -> Result<Schema> {
        self.build_with_config(&RegistryConfig::default())
    }

    /// Validate against explicit limits and freeze the layout.
    pub fn build_with_config(self, config: &RegistryConfig) -> Result<Schema> {
        if self.pending.len() > config.max_fields {
            return Err(SchemaError::TooManyFields {
                count: self.pending.len(),
                max: config.max_fields,
            });
        }

        let mut by_name = HashMap::with_capacity(self.pending.len());
        let mut previous_event: Option<u8> = None;
        for field in &self.pending {
            validate_field(field, &mut previous_event)?;
        }

        // Stable sort keeps declaration order inside each tier.
        let mut fields = self.pending;
        fields.sort_by_key(|field| field.tier());

        let mut spans: [Range<usize>; TIER_COUNT] = Default::default();
        let mut tier_sizes = [0usize; TIER_COUNT];
        for tier in Tier::ALL {
            let start = fields.partition_point(|field| field.tier() < tier);
            let end = fields.partition_point(|field| field.tier() <= tier);
            spans[tier.index()] = start..end;
            tier_sizes[tier.index()] = fields[start..end].iter().map(SensorField::size).sum();
        }

        for (index, field) in fields.iter().enumerate() {
            if by_name.insert(field.name().to_string(), index).is_some() {
                return Err(SchemaError::DuplicateField(field.name().to_string()));
            }
        }

        let schema = Schema {
            name: self.name,
            fields,
            spans,
            tier_sizes,
            by_name,
        };

        if schema.max_frame_len() > config.max_frame_size {
            return Err(SchemaError::FrameTooLarge {
                size: schema.max_frame_len(),
                max: config.max_frame_size,
            });
        }

        debug!(
            schema = %schema.name,
            fields = schema.len(),
            max_frame_len = schema.max_frame_len(),
            "schema built"
        );
        Ok(schema)
    }
}

fn validate_field(field: &SensorField, previous_event: &mut Option<u8>) -> Result<()> {
    if field.name().is_empty() {
        return Err(SchemaError::EmptyFieldName);
    }

    if let FieldKind::Quantized { scale, bias, .. } = field.kind() {
        if !(scale.is_finite() && scale > 0.0 && bias.is_finite()) {
            return Err(SchemaError::InvalidQuantizer {
                field: field.name().to_string(),
                scale,
                bias,
            });
        }
    }

    match (field.tier(), field.event()) {
        (Tier::Conditional, Some(event)) if event <= MAX_EVENT => {
            if let Some(previous) = *previous_event {
                if event <= previous {
                    return Err(SchemaError::EventOrder {
                        field: field.name().to_string(),
                        event,
                        previous,
                    });
                }
            }
            *previous_event = Some(event);
            Ok(())
        }
        (Tier::Conditional, event) => Err(SchemaError::InvalidEvent {
            field: field.name().to_string(),
            event,
            max: MAX_EVENT,
        }),
        (_, Some(event)) => Err(SchemaError::InvalidEvent {
            field: field.name().to_string(),
            event: Some(event),
            max: MAX_EVENT,
        }),
        (_, None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::RawWidth;

    fn sample() -> Schema {
        Schema::builder("sample")
            .slow("coolant", FieldKind::U16)
            .fast("speed", FieldKind::F32)
            .conditional("control", 1, FieldKind::U8)
            .fast("rpm", FieldKind::U16)
            .medium("soc", FieldKind::U8)
            .build()
            .unwrap()
    }

    #[test]
    fn fields_sorted_into_priority_order() {
        let schema = sample();
        let names: Vec<&str> = schema
            .all_fields_in_priority_order()
            .iter()
            .map(SensorField::name)
            .collect();
        assert_eq!(names, vec!["speed", "rpm", "soc", "coolant", "control"]);
    }

    #[test]
    fn tier_sizes_are_packed_sums() {
        let schema = sample();
        assert_eq!(schema.tier_byte_size(Tier::Fast), 6);
        assert_eq!(schema.tier_byte_size(Tier::Medium), 1);
        assert_eq!(schema.tier_byte_size(Tier::Slow), 2);
        assert_eq!(schema.tier_byte_size(Tier::Conditional), 1);
        assert_eq!(schema.max_frame_len(), HEADER_SIZE + 10);
    }

    #[test]
    fn lookups_by_name_and_event() {
        let schema = sample();
        assert_eq!(schema.index_of("rpm"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.conditional_index(1), Some(4));
        assert_eq!(schema.conditional_index(0), None);
        assert_eq!(schema.fields_in(Tier::Fast).len(), 2);
        assert_eq!(schema.span(Tier::Slow), 3..4);
    }

    #[test]
    fn empty_tiers_have_empty_spans() {
        let schema = Schema::builder("fast-only")
            .fast("a", FieldKind::U8)
            .build()
            .unwrap();
        assert!(schema.fields_in(Tier::Medium).is_empty());
        assert_eq!(schema.tier_byte_size(Tier::Slow), 0);
        assert_eq!(schema.span(Tier::Conditional), 1..1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Schema::builder("dup")
            .fast("a", FieldKind::U8)
            .slow("a", FieldKind::U8)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn conditional_events_validated() {
        let err = Schema::builder("bad-event")
            .conditional("x", MAX_EVENT + 1, FieldKind::U8)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEvent { .. }));

        let err = Schema::builder("order")
            .conditional("x", 3, FieldKind::U8)
            .conditional("y", 2, FieldKind::U8)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::EventOrder {
                event: 2,
                previous: 3,
                ..
            }
        ));
    }

    #[test]
    fn quantizer_scale_validated() {
        let err = Schema::builder("q")
            .fast(
                "temp",
                FieldKind::Quantized {
                    raw: RawWidth::U16,
                    scale: 0.0,
                    bias: 0.0,
                },
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidQuantizer { .. }));
    }

    #[test]
    fn frame_size_limit_enforced() {
        let config = RegistryConfig {
            max_frame_size: 8,
            ..RegistryConfig::default()
        };
        let err = Schema::builder("big")
            .fast("a", FieldKind::U64)
            .build_with_config(&config)
            .unwrap_err();
        assert!(matches!(err, SchemaError::FrameTooLarge { size: 10, max: 8 }));
    }

    #[test]
    fn field_count_limit_enforced() {
        let config = RegistryConfig {
            max_fields: 1,
            ..RegistryConfig::default()
        };
        let err = Schema::builder("many")
            .fast("a", FieldKind::U8)
            .fast("b", FieldKind::U8)
            .build_with_config(&config)
            .unwrap_err();
        assert!(matches!(err, SchemaError::TooManyFields { count: 2, max: 1 }));
    }
}
