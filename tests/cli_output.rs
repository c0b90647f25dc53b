use std::process::Command;

/// Runs the binary against an API address that refuses connections, with
/// verbose logging, so every source fails and plenty of log lines are written.
fn run_against_unreachable_api(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_arena-dashboard"))
        .args(args)
        .env("RUST_LOG", "debug")
        .env("DASHBOARD__CLIENT__BASE_URL", "http://127.0.0.1:9")
        .env("DASHBOARD__CLIENT__MAX_RETRIES", "0")
        .output()
        .expect("binary runs")
}

#[test]
fn snapshot_stdout_is_pure_json() {
    let output = run_against_unreachable_api(&["snapshot", "--user", "u1"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout parses as JSON");
    assert_eq!(snapshot["userId"], "u1");
    assert_eq!(snapshot["hasErrors"], true);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Aggregator initialized."));
}

#[test]
fn compact_logs_also_stay_off_stdout() {
    let output = run_against_unreachable_api(&["--log-format", "compact", "snapshot", "--user", "u1"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Aggregator initialized."));
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_ok());
}
