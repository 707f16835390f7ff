#![cfg(unix)]

use guj_extract::engine::process::{run_tool, tool_banner};
use std::time::Instant;

#[test]
fn captures_stdout() {
    let out = run_tool("sh", ["-c", "printf 'ગુજરાતી'"], 10, true).expect("run sh");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ગુજરાતી");
}

#[test]
fn failing_exit_carries_stderr() {
    let err = run_tool("sh", ["-c", "echo broken >&2; exit 3"], 0, true).expect_err("exit 3");
    let msg = format!("{err:#}");
    assert!(msg.contains("broken"), "{msg}");
}

#[test]
fn timeout_kills_the_tool() {
    let started = Instant::now();
    let err =
        run_tool("sh", ["-c", "printf partial; exec sleep 30"], 1, true).expect_err("timeout");
    assert!(started.elapsed().as_secs() < 10);
    assert!(format!("{err:#}").contains("exceeded timeout of 1s"));
}

#[test]
fn missing_tool_is_an_error() {
    assert!(run_tool("guj-extract-no-such-tool", ["x"], 1, true).is_err());
    assert!(tool_banner("guj-extract-no-such-tool", "--version").is_err());
}
