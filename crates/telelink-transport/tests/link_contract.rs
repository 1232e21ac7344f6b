use std::net::SocketAddr;
use std::time::{Duration, Instant};

use telelink_transport::{Link, LoopbackLink, TransportError, UdpLink, RFM95_MAX_MESSAGE_LEN};

fn exchange<L: Link>(tx: &mut L, rx: &mut L) {
    let frames: [&[u8]; 3] = [&[0x01, 0x00, 0x64, 0x00], &[0x00, 0x00], &[0x10, 0x00, 0x07]];
    for frame in frames {
        tx.send(frame).unwrap();
    }

    let mut buf = vec![0u8; rx.max_frame_size() + 1];
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut got = Vec::new();
    while got.len() < frames.len() {
        if let Some(n) = rx.receive(&mut buf).unwrap() {
            got.push(buf[..n].to_vec());
        }
        assert!(Instant::now() < deadline, "frames did not arrive");
    }
    assert_eq!(got, frames.map(<[u8]>::to_vec));
}

fn reject_oversized<L: Link>(tx: &mut L) {
    let frame = vec![0u8; tx.max_frame_size() + 1];
    assert!(matches!(
        tx.send(&frame),
        Err(TransportError::FrameTooLarge { .. })
    ));
}

#[test]
fn loopback_honors_link_contract() {
    let (mut a, mut b) = LoopbackLink::pair();
    assert_eq!(a.max_frame_size(), RFM95_MAX_MESSAGE_LEN);
    exchange(&mut a, &mut b);
    reject_oversized(&mut a);
}

#[test]
fn udp_honors_link_contract() {
    let mut rx = UdpLink::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
    let mut tx = UdpLink::connect(rx.local_addr().unwrap()).unwrap();
    assert_eq!(tx.max_frame_size(), RFM95_MAX_MESSAGE_LEN);
    exchange(&mut tx, &mut rx);
    reject_oversized(&mut tx);
}
