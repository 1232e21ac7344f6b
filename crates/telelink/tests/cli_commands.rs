#![cfg(feature = "cli")]

use std::net::UdpSocket;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::Value;

fn telelink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_telelink"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("telelink should run")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("command should print a line");
    serde_json::from_str(line).expect("stdout should be JSON")
}

fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("ephemeral bind should succeed");
    socket.local_addr().expect("local addr").port()
}

#[test]
fn schema_lists_wheels_layout() {
    let output = telelink(&["schema"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["name"], "wheels");
    assert_eq!(json["tier_sizes"]["fast"], 22);
    assert_eq!(json["max_frame_len"], 27);
}

#[test]
fn encode_scenario_frame() {
    let output = telelink(&[
        "encode",
        "--variant",
        "scenario",
        "--values",
        r#"{"a":100,"b":200,"s":5,"c":7}"#,
        "--tiers",
        "fast",
        "--events",
        "1",
    ]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["code"], 0b10001);
    assert_eq!(json["len"], 7);
    assert_eq!(json["hex"], "11006400c80007");
}

#[test]
fn decode_scenario_frame() {
    let output = telelink(&["decode", "--variant", "scenario", "11006400c80007"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["code"], 17);
    assert_eq!(json["fields"]["fast"]["a"], 100);
    assert_eq!(json["fields"]["fast"]["b"], 200);
    assert_eq!(json["fields"]["slow"]["s"], 0);
    assert_eq!(json["fields"]["conditional"]["c"], 7);
}

#[test]
fn decode_truncated_frame_exits_data_invalid() {
    let output = telelink(&["decode", "--variant", "scenario", "1100 6400"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("truncated"));
}

#[test]
fn decode_trailing_bytes_needs_flag() {
    let frame = "01006400c8000009";
    let output = telelink(&["decode", "--variant", "scenario", frame]);
    assert_eq!(output.status.code(), Some(60));

    let output = telelink(&["decode", "--variant", "scenario", "--allow-trailing", frame]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["fields"]["fast"]["a"], 100);
}

#[test]
fn unknown_variant_is_usage_error() {
    let output = telelink(&["schema", "--variant", "tractor"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn send_reaches_listener_over_udp() {
    let port = free_udp_port();
    let addr = format!("127.0.0.1:{port}");

    let listener = Command::new(env!("CARGO_BIN_EXE_telelink"))
        .args(["--log-level", "error", "--format", "json"])
        .args(["listen", "--variant", "scenario", "--bind", &addr, "--count", "1"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listener should start");
    thread::sleep(Duration::from_millis(200));

    let sent = telelink(&["send", "--variant", "scenario", "--to", &addr, "--count", "200"]);
    assert!(sent.status.success());
    let summary = stdout_json(&sent);
    assert_eq!(summary["frames"], 200);

    let received = listener.wait_with_output().expect("listener should exit");
    assert!(received.status.success());
    let json = stdout_json(&received);
    assert!(json["fields"]["fast"].get("a").is_some());
}
