use std::sync::{Arc, Mutex, MutexGuard};

use telelink_frame::{DirtyFlags, FrameWriter, SensorStore, SensorValue};
use telelink_schema::{FieldKind, Schema, Tier, MAX_EVENT};
use telelink_transport::Link;
use tracing::{debug, warn};

use crate::error::{NodeError, Result};
use crate::schedule::Due;

/// Field name picked up as the packet counter by [`TxNode::new`].
pub const PACKET_COUNTER_FIELD: &str = "packetnum";

struct TxState {
    flags: DirtyFlags,
    store: SensorStore,
}

/// Transmit-side node context.
///
/// Dirty flags and the sensor store share one lock. [`TxNode::send`] holds
/// it from draining the flags through serializing the frame, so a tier
/// marked dirty concurrently lands in this frame or the next one.
pub struct TxNode {
    schema: Arc<Schema>,
    state: Mutex<TxState>,
    counter: Option<usize>,
}

impl TxNode {
    /// Create a node for `schema`. A field named [`PACKET_COUNTER_FIELD`], if
    /// present, is incremented on every fast tick.
    pub fn new(schema: Arc<Schema>) -> Self {
        let counter = schema
            .index_of(PACKET_COUNTER_FIELD)
            .filter(|&index| is_counter_kind(&schema, index));
        Self {
            state: Mutex::new(TxState {
                flags: DirtyFlags::new(),
                store: SensorStore::new(Arc::clone(&schema)),
            }),
            schema,
            counter,
        }
    }

    /// Use `name` as the packet counter instead.
    pub fn with_packet_counter(mut self, name: &str) -> Result<Self> {
        let index = self.index(name)?;
        if !is_counter_kind(&self.schema, index) {
            return Err(NodeError::InvalidCounter(name.to_string()));
        }
        self.counter = Some(index);
        Ok(self)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Store a value without marking anything dirty. It goes out with the
    /// next frame that carries its tier.
    pub fn set(&self, name: &str, value: impl Into<SensorValue>) -> Result<()> {
        let index = self.index(name)?;
        self.lock()?.store.set(index, value)?;
        Ok(())
    }

    /// Store a value and mark its tier dirty. For a conditional field this
    /// raises the field's event.
    pub fn update(&self, name: &str, value: impl Into<SensorValue>) -> Result<()> {
        let index = self.index(name)?;
        let mut state = self.lock()?;
        state.store.set(index, value)?;
        if let Some(field) = self.schema.field(index) {
            match field.event() {
                Some(event) => state.flags.raise_event(event),
                None => state.flags.mark(field.tier()),
            };
        }
        Ok(())
    }

    /// Link a field to a live accessor, read each time a frame is built.
    pub fn link<F>(&self, name: &str, accessor: F) -> Result<()>
    where
        F: Fn() -> SensorValue + Send + Sync + 'static,
    {
        let index = self.index(name)?;
        self.lock()?.store.link(index, accessor)?;
        Ok(())
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Result<SensorValue> {
        let index = self.index(name)?;
        Ok(self.lock()?.store.get(index)?)
    }

    /// Fast tier handler: bump the packet counter and mark Fast dirty.
    ///
    /// A counter linked to an accessor is left alone; the accessor owns it.
    pub fn tick_fast(&self) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(index) = self.counter.filter(|&index| !state.store.is_linked(index)) {
            let next = next_count(&self.schema, index, state.store.get(index)?);
            state.store.set(index, next)?;
        }
        state.flags.mark(Tier::Fast);
        Ok(())
    }

    /// Medium tier handler.
    pub fn tick_medium(&self) -> Result<()> {
        self.lock()?.flags.mark(Tier::Medium);
        Ok(())
    }

    /// Slow tier handler.
    pub fn tick_slow(&self) -> Result<()> {
        self.lock()?.flags.mark(Tier::Slow);
        Ok(())
    }

    /// Raise a conditional event for the next frame.
    pub fn raise_event(&self, event: u8) -> Result<()> {
        if !self.lock()?.flags.raise_event(event) {
            return Err(NodeError::InvalidEvent {
                event,
                max: MAX_EVENT,
            });
        }
        Ok(())
    }

    /// Whether anything is waiting to be sent.
    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.lock()?.flags.is_clean())
    }

    /// Drain the dirty flags and send one frame.
    ///
    /// Returns the frame length, or zero when nothing was dirty. On error the
    /// frame is dropped; the drained flags are not restored.
    pub fn send<L: Link>(&self, writer: &mut FrameWriter<L>) -> Result<usize> {
        let mut state = self.lock()?;
        let TxState { flags, store } = &mut *state;
        match writer.send_dirty(flags, store) {
            Ok(len) => Ok(len),
            Err(err) => {
                warn!(error = %err, "dropping outgoing frame");
                Err(err.into())
            }
        }
    }

    /// Run the handlers `due` selects, ticks before the send.
    pub fn run_due<L: Link>(&self, due: Due, writer: &mut FrameWriter<L>) -> Result<usize> {
        if !due.any() {
            return Ok(0);
        }
        if due.fast {
            self.tick_fast()?;
        }
        if due.medium {
            self.tick_medium()?;
        }
        if due.slow {
            self.tick_slow()?;
        }
        if !due.send {
            return Ok(0);
        }
        let len = self.send(writer)?;
        if len > 0 {
            debug!(len, "tick frame sent");
        }
        Ok(len)
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| NodeError::UnknownField(name.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, TxState>> {
        self.state.lock().map_err(|_| NodeError::LockPoisoned)
    }
}

fn is_counter_kind(schema: &Schema, index: usize) -> bool {
    schema.field(index).is_some_and(|field| {
        matches!(
            field.kind(),
            FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64
        )
    })
}

/// Counter value after `current`, wrapping at the field's width.
fn next_count(schema: &Schema, index: usize, current: SensorValue) -> u64 {
    let bits = schema.field(index).map_or(64, |field| field.size() * 8);
    let max = u64::MAX >> (64 - bits);
    match current.as_u64() {
        Some(value) if value < max => value + 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use telelink_transport::LoopbackLink;

    use super::*;

    fn node() -> TxNode {
        TxNode::new(Arc::new(Schema::scenario().unwrap()))
    }

    fn drain(rx: &mut LoopbackLink) -> Vec<u8> {
        let mut buf = [0u8; 64];
        let n = rx.receive(&mut buf).unwrap().unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn scenario_frame_from_ticks() {
        let node = node();
        let (tx, mut rx) = LoopbackLink::pair();
        let mut writer = FrameWriter::new(tx);

        node.set("a", 100u16).unwrap();
        node.set("b", 200u16).unwrap();
        node.update("c", 7u8).unwrap();
        node.tick_fast().unwrap();

        assert_eq!(node.send(&mut writer).unwrap(), 7);
        assert_eq!(drain(&mut rx), [0x11, 0x00, 0x64, 0x00, 0xC8, 0x00, 0x07]);

        assert!(!node.is_dirty().unwrap());
        assert_eq!(node.send(&mut writer).unwrap(), 0);
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn packet_counter_wraps_at_width() {
        let schema = Schema::builder("count")
            .fast(PACKET_COUNTER_FIELD, FieldKind::U8)
            .build()
            .unwrap();
        let node = TxNode::new(Arc::new(schema));
        node.set(PACKET_COUNTER_FIELD, 254u8).unwrap();

        node.tick_fast().unwrap();
        assert_eq!(
            node.get(PACKET_COUNTER_FIELD).unwrap(),
            SensorValue::Unsigned(255)
        );
        node.tick_fast().unwrap();
        assert_eq!(
            node.get(PACKET_COUNTER_FIELD).unwrap(),
            SensorValue::Unsigned(0)
        );
    }

    #[test]
    fn linked_counter_left_to_accessor() {
        let schema = Schema::builder("count")
            .fast(PACKET_COUNTER_FIELD, FieldKind::U16)
            .build()
            .unwrap();
        let node = TxNode::new(Arc::new(schema));
        let source = Arc::new(AtomicU64::new(40));
        let reader = Arc::clone(&source);
        node.link(PACKET_COUNTER_FIELD, move || {
            SensorValue::Unsigned(reader.load(Ordering::SeqCst))
        })
        .unwrap();

        node.tick_fast().unwrap();
        node.tick_fast().unwrap();
        assert_eq!(
            node.get(PACKET_COUNTER_FIELD).unwrap(),
            SensorValue::Unsigned(40)
        );
        source.store(41, Ordering::SeqCst);
        assert_eq!(
            node.get(PACKET_COUNTER_FIELD).unwrap(),
            SensorValue::Unsigned(41)
        );
        assert!(node.is_dirty().unwrap());
    }

    #[test]
    fn counter_must_be_unsigned() {
        let schema = Schema::builder("count")
            .fast("seq", FieldKind::I16)
            .build()
            .unwrap();
        let err = TxNode::new(Arc::new(schema))
            .with_packet_counter("seq")
            .err()
            .unwrap();
        assert!(matches!(err, NodeError::InvalidCounter(_)));
    }

    #[test]
    fn invalid_event_and_field_rejected() {
        let node = node();
        assert!(matches!(
            node.raise_event(MAX_EVENT + 1),
            Err(NodeError::InvalidEvent { .. })
        ));
        assert!(matches!(
            node.set("missing", 1u8),
            Err(NodeError::UnknownField(_))
        ));
    }

    #[test]
    fn pure_signal_event_sends_header_only() {
        let node = node();
        let (tx, mut rx) = LoopbackLink::pair();
        let mut writer = FrameWriter::new(tx);

        node.raise_event(0).unwrap();
        assert_eq!(node.send(&mut writer).unwrap(), 2);
        assert_eq!(drain(&mut rx), [0x08, 0x00]);
    }

    #[test]
    fn run_due_ticks_before_sending() {
        let node = node();
        let (tx, mut rx) = LoopbackLink::pair();
        let mut writer = FrameWriter::new(tx);
        let due = Due {
            slow: true,
            send: true,
            ..Due::default()
        };

        assert_eq!(node.run_due(due, &mut writer).unwrap(), 4);
        assert_eq!(drain(&mut rx), [0x04, 0x00, 0x00, 0x00]);

        node.update("a", 1u16).unwrap();
        assert_eq!(node.run_due(Due::default(), &mut writer).unwrap(), 0);
        assert!(node.is_dirty().unwrap());
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn linked_value_sent_live() {
        let node = node();
        let source = Arc::new(AtomicU64::new(5));
        let reader = Arc::clone(&source);
        node.link("s", move || SensorValue::Unsigned(reader.load(Ordering::SeqCst)))
            .unwrap();
        source.store(0x0203, Ordering::SeqCst);

        let (tx, mut rx) = LoopbackLink::pair();
        let mut writer = FrameWriter::new(tx);
        node.tick_slow().unwrap();
        node.send(&mut writer).unwrap();
        assert_eq!(drain(&mut rx), [0x04, 0x00, 0x03, 0x02]);
    }

    #[test]
    fn node_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TxNode>();
    }
}
