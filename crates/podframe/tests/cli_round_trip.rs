#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn podframe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_podframe"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("podframe should run")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn demo_replays_sample_blocks_after_growth() {
    let output = podframe(&["demo", "--initial-capacity", "4", "--header-len", "4"]);
    let report = json(&output);

    assert_eq!(report["initial_capacity"], 4);
    assert!(report["capacity"].as_u64().unwrap() > 4);

    let blocks = report["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], "dev1");
    assert_eq!(blocks[1]["id"], "dev2");
    assert_eq!(blocks[0]["fields"][0], "4096");
    assert_eq!(blocks[0]["fields"][1], "'a'");
    assert_eq!(blocks[0]["fields"][2], "NULL");
    assert_eq!(blocks[0]["fields"][3], "'A'");
    assert_eq!(blocks[1]["fields"][0], "4097");
    assert_eq!(blocks[1]["fields"][1], "'b'");
}

#[test]
fn demo_variable_mode_and_dump() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let dump = dir.path().join("buf.bin");
    let output = podframe(&[
        "demo",
        "--variable",
        "--blocks",
        "3",
        "--dump",
        dump.to_str().unwrap(),
    ]);
    let report = json(&output);

    assert_eq!(report["header_mode"], "variable");
    assert_eq!(report["blocks"].as_array().unwrap().len(), 3);
    let dumped = std::fs::read(&dump).expect("dump should exist");
    assert_eq!(dumped.len() as u64, report["capacity"].as_u64().unwrap());
}

#[test]
fn encode_then_inspect_round_trip() {
    let encoded = podframe(&[
        "encode",
        "--variable",
        "--block",
        "thermo-1=u32:7,f64:21.5,str:celsius",
        "--block",
        "=u32:8,f64:-3.25,null",
    ]);
    let report = json(&encoded);
    let text = report["encoded"].as_str().unwrap().to_string();

    let mut child = Command::new(env!("CARGO_BIN_EXE_podframe"))
        .args(["--log-level", "error", "--format", "json", "inspect"])
        .args(["--variable", "--kinds", "u32,f64,str"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("inspect should start");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(text.as_bytes())
        .unwrap();
    let inspected = json(&child.wait_with_output().unwrap());

    let blocks = inspected["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["id"], "thermo-1");
    assert_eq!(blocks[0]["fields"][2], "celsius");
    assert_eq!(blocks[1]["anonymous"], true);
    assert_eq!(blocks[1]["fields"][1], "-3.25");
    assert_eq!(blocks[1]["fields"][2], "NULL");
}

#[test]
fn inspect_rejects_bad_base64() {
    let output = podframe(&["inspect", "###"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn inspect_reports_mismatched_kinds() {
    let encoded = podframe(&["encode", "--block", "dev1=u8:1"]);
    let text = json(&encoded)["encoded"].as_str().unwrap().to_string();

    let output = podframe(&["inspect", &text, "--kinds", "u64"]);
    assert_eq!(output.status.code(), Some(60));
}
