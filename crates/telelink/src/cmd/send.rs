use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use telelink_frame::{FrameWriter, Quantizer, SensorValue};
use telelink_node::{TickIntervals, TickSchedule, TxNode, PACKET_COUNTER_FIELD};
use telelink_schema::{FieldKind, SensorField, Tier};
use telelink_transport::UdpLink;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, SendArgs};
use crate::exit::{node_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_send_summary, OutputFormat, SendSummary};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    let link = UdpLink::connect(args.to).map_err(|err| transport_error("connect failed", err))?;
    let mut writer = FrameWriter::new(link);

    let node = TxNode::new(Arc::clone(&schema));
    let clock = Arc::new(AtomicU64::new(0));
    for field in schema.all_fields_in_priority_order() {
        if field.name() == PACKET_COUNTER_FIELD {
            continue;
        }
        let field_clock = Arc::clone(&clock);
        let generator = synthetic(field);
        node.link(field.name(), move || {
            generator(field_clock.load(Ordering::Relaxed))
        })
        .map_err(|err| node_error("link failed", err))?;
    }
    let events: Vec<u8> = schema
        .fields_in(Tier::Conditional)
        .iter()
        .filter_map(SensorField::event)
        .collect();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let intervals = TickIntervals {
        fast: args.fast,
        medium: args.medium,
        slow: args.slow,
        send: args.send,
    };
    let mut schedule = TickSchedule::new(intervals, Instant::now());
    info!(to = %args.to, schema = %schema.name(), "transmitter started");

    let mut frames = 0u64;
    let mut bytes = 0u64;
    let mut dropped = 0u64;
    while running.load(Ordering::SeqCst) {
        let due = schedule.due(Instant::now());
        if due.fast {
            clock.fetch_add(1, Ordering::Relaxed);
        }
        if due.slow {
            for &event in &events {
                node.raise_event(event)
                    .map_err(|err| node_error("raise event failed", err))?;
            }
        }

        match node.run_due(due, &mut writer) {
            Ok(0) => {}
            Ok(len) => {
                frames += 1;
                bytes += len as u64;
            }
            // Already logged by the node.
            Err(_) => dropped += 1,
        }

        if args.count.is_some_and(|count| frames >= count) {
            break;
        }
        thread::sleep(schedule.next_deadline().saturating_duration_since(Instant::now()));
    }

    info!(frames, bytes, dropped, "transmitter stopped");
    print_send_summary(
        &SendSummary {
            to: args.to.to_string(),
            frames,
            bytes,
            dropped,
        },
        format,
    );
    Ok(SUCCESS)
}

/// Value source for a field, as a function of the fast tick count.
fn synthetic(field: &SensorField) -> impl Fn(u64) -> SensorValue + Send + Sync + 'static {
    let kind = field.kind();
    move |tick| {
        let phase = tick as f64 / 100.0;
        match kind {
            FieldKind::Quantized { raw, scale, bias } => {
                let (min, max) = Quantizer::new(scale, bias)
                    .map(|q| q.range(raw))
                    .unwrap_or((bias, bias));
                let span = (max - min).min(200.0);
                SensorValue::Float(min + span * 0.5 * (1.0 + phase.sin()))
            }
            FieldKind::F32 | FieldKind::F64 => SensorValue::Float(phase.sin() * 100.0),
            FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 => {
                SensorValue::Signed((tick % 200) as i64 - 100)
            }
            _ => SensorValue::Unsigned(tick % 256),
        }
    }
}
