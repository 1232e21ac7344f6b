use std::fmt;
use std::sync::Arc;

use telelink_schema::Schema;

use crate::error::{FrameError, Result};
use crate::value::SensorValue;

/// Live source for a field's value, read each time a frame is built.
pub type Accessor = Arc<dyn Fn() -> SensorValue + Send + Sync>;

enum Slot {
    Owned(SensorValue),
    Linked(Accessor),
}

/// Current value of every field in a schema, indexed in priority order.
///
/// A slot either owns its value or is linked to an [`Accessor`] that yields
/// the value on demand. Values are checked against their field's wire
/// encoding when set, so a store the codec reads from never holds an
/// unencodable owned value.
pub struct SensorStore {
    schema: Arc<Schema>,
    slots: Vec<Slot>,
}

impl SensorStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        let slots = schema
            .all_fields_in_priority_order()
            .iter()
            .map(|field| Slot::Owned(SensorValue::zero(field.kind())))
            .collect();
        Self { schema, slots }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current value of field `index`, calling its accessor if linked.
    pub fn get(&self, index: usize) -> Result<SensorValue> {
        match self.slots.get(index) {
            Some(Slot::Owned(value)) => Ok(*value),
            Some(Slot::Linked(accessor)) => Ok(accessor()),
            None => Err(FrameError::UnknownField(index.to_string())),
        }
    }

    /// Set field `index`. Replaces any accessor link.
    pub fn set(&mut self, index: usize, value: impl Into<SensorValue>) -> Result<()> {
        let value = value.into();
        let field = self
            .schema
            .field(index)
            .ok_or_else(|| FrameError::UnknownField(index.to_string()))?;
        let mut scratch = [0u8; 8];
        value.encode(field, &mut scratch[..field.size()])?;
        self.slots[index] = Slot::Owned(value);
        Ok(())
    }

    /// Link field `index` to a live accessor.
    pub fn link<F>(&mut self, index: usize, accessor: F) -> Result<()>
    where
        F: Fn() -> SensorValue + Send + Sync + 'static,
    {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| FrameError::UnknownField(index.to_string()))?;
        *slot = Slot::Linked(Arc::new(accessor));
        Ok(())
    }

    pub fn is_linked(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Linked(_)))
    }

    pub fn get_by_name(&self, name: &str) -> Result<SensorValue> {
        self.get(self.index(name)?)
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<SensorValue>) -> Result<()> {
        let index = self.index(name)?;
        self.set(index, value)
    }

    /// Store a value that came off the wire. Decoded values are encodable by
    /// construction, so no re-check.
    pub(crate) fn put_decoded(&mut self, index: usize, value: SensorValue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Owned(value);
        }
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| FrameError::UnknownField(name.to_string()))
    }
}

impl fmt::Debug for SensorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (field, slot) in self.schema.all_fields_in_priority_order().iter().zip(&self.slots) {
            match slot {
                Slot::Owned(value) => map.entry(&field.name(), value),
                Slot::Linked(_) => map.entry(&field.name(), &"<linked>"),
            };
        }
        map.finish()
    }
}
