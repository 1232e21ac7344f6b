use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use telelink_node::RxNode;
use telelink_transport::{Link, UdpLink};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{node_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_snapshot, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    let mut link = UdpLink::bind(args.bind).map_err(|err| transport_error("bind failed", err))?;
    let local = link
        .local_addr()
        .map_err(|err| transport_error("bind failed", err))?;
    let node = RxNode::new(schema);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;
    info!(addr = %local, schema = %node.schema().name(), "receiver listening");

    // One spare byte so oversized datagrams are rejected rather than cut.
    let mut buf = vec![0u8; link.max_frame_size() + 1];
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let len = match link.receive(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => continue,
            Err(err) => return Err(transport_error("receive failed", err)),
        };

        // Rejected frames are logged by the node; keep listening.
        let Ok(code) = node.apply(&buf[..len]) else {
            continue;
        };
        let snapshot = node
            .snapshot()
            .map_err(|err| node_error("snapshot failed", err))?;
        print_snapshot(code, &buf[..len], &snapshot, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    let stats = node.stats();
    info!(received = stats.received, dropped = stats.dropped, "receiver stopped");
    Ok(SUCCESS)
}

