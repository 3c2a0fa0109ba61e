use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fls_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("fls");
    path
}

fn result_json(id: &str, provider: &str, total: Option<f64>) -> String {
    let price = match total {
        Some(t) => format!(r#"{{"total": {}, "currency": "USD"}}"#, t),
        None => r#"{"currency": "USD"}"#.to_string(),
    };
    format!(
        r#"{{"id": "{id}", "provider": {{"name": "{provider}", "presentationName": "{provider} Travel"}},
"legs": [{{"segments": [{{"route": {{"departure": {{"location": "JFK", "datetime": "2024-01-01T08:00:00"}},
"arrival": {{"location": "ZZZ"}}}}, "transport": {{"number": "100", "carriers": {{"marketing": "AA"}}}}}}]}}],
"resources": {{"locations": {{"JFK": {{"name": "JFK", "city": "New York", "country": "US"}}}}}},
"passengers": {{"adults": {{"price": {price}}}}}}}"#
    )
    .replace('\n', " ")
}

fn message(results: &[String]) -> String {
    format!(
        "data: {{\"resourceId\": \"abc123\", \"data\": [{}]}}\n\n",
        results.join(",")
    )
}

fn setup_capture(body: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("capture.sse");
    fs::write(&path, body).unwrap();
    (tmp, path)
}

fn run_fls(config_dir: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = fls_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_dir.join("missing.toml"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run fls binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn events(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad line {:?}: {}", l, e)))
        .collect()
}

#[test]
fn test_replay_json_records_and_summaries() {
    let body = format!(
        ": keep-alive\n\n{}{}event: stop\ndata:\n\n",
        message(&[
            result_json("r1", "Acme", Some(99.5)),
            result_json("r2", "Acme", Some(120.0))
        ]),
        message(&[result_json("r3", "Acme", Some(80.0))]),
    );
    let (tmp, path) = setup_capture(&body);

    let (stdout, stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "json"],
    );
    assert!(ok, "replay failed: {}", stderr);

    let events = events(&stdout);
    let records: Vec<_> = events.iter().filter(|e| e["event"] == "record").collect();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0]["record"]["lines"][0],
        "AA100 - JFK (New York, US) > ZZZ <small>2024-01-01T08:00:00</small><br />"
    );
    assert_eq!(records[2]["record"]["resultId"], "r3");

    let counts: Vec<_> = events
        .iter()
        .filter(|e| e["event"] == "provider")
        .map(|e| e["summary"]["count"].as_u64().unwrap())
        .collect();
    assert_eq!(counts, vec![2, 3]);

    let last = events.last().unwrap();
    assert_eq!(last["event"], "closed");
    assert_eq!(last["end"], "stopped");
}

#[test]
fn test_replay_skips_bad_frame_and_unpriced_result() {
    let body = format!(
        "data: {{not json\n\n{}{}event: stop\n\n",
        message(&[result_json("r1", "Acme", None)]),
        message(&[result_json("r2", "Acme", Some(50.0))]),
    );
    let (tmp, path) = setup_capture(&body);

    let (stdout, _stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "json"],
    );
    assert!(ok);

    let events = events(&stdout);
    let errors = events.iter().filter(|e| e["event"] == "error").count();
    assert_eq!(errors, 2);
    let records: Vec<_> = events.iter().filter(|e| e["event"] == "record").collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["record"]["resultId"], "r2");
}

#[test]
fn test_replay_without_stop_ends_cleanly() {
    let body = format!(
        "{}{}",
        message(&[result_json("r1", "Acme", Some(10.0))]),
        message(&[result_json("r2", "Acme", Some(12.0))]),
    );
    let (tmp, path) = setup_capture(&body);

    let (stdout, stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "json"],
    );
    assert!(ok, "replay failed: {}", stderr);

    let events = events(&stdout);
    assert_eq!(events.iter().filter(|e| e["event"] == "record").count(), 2);
    assert_eq!(events.iter().filter(|e| e["event"] == "error").count(), 0);
    assert_eq!(events.last().unwrap()["end"], "ended");
}

#[test]
fn test_replay_error_event_fails() {
    let body = format!(
        "{}event: error\ndata: provider timeout\n\n",
        message(&[result_json("r1", "Acme", Some(10.0))]),
    );
    let (tmp, path) = setup_capture(&body);

    let (stdout, _stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "json"],
    );
    assert!(!ok);

    let events = events(&stdout);
    assert_eq!(events.iter().filter(|e| e["event"] == "record").count(), 1);
    let last = events.last().unwrap();
    assert_eq!(last["end"], "failed");
    assert!(last["error"].as_str().unwrap().contains("provider timeout"));
}

#[test]
fn test_replay_human_output() {
    let body = format!(
        "{}event: stop\n\n",
        message(&[result_json("r1", "Acme", Some(99.5))])
    );
    let (tmp, path) = setup_capture(&body);

    let (stdout, stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "human"],
    );
    assert!(ok, "replay failed: {}", stderr);
    assert!(stdout.contains("99.5USD  Acme Travel"));
    assert!(stdout.contains("AA100 - JFK (New York, US) > ZZZ 2024-01-01T08:00:00"));
    assert!(stdout.contains("PROVIDER"));
    assert!(stdout.contains("Acme Travel"));
}

#[test]
fn test_unknown_output_format_is_rejected() {
    let (tmp, path) = setup_capture("event: stop\n\n");
    let (_stdout, stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "xml"],
    );
    assert!(!ok);
    assert!(stderr.contains("Unknown output format"));
}

#[test]
fn test_broken_config_file_is_reported() {
    let (tmp, path) = setup_capture("event: stop\n\n");
    fs::write(tmp.path().join("missing.toml"), "[server\nbase_url = ").unwrap();

    let (_stdout, stderr, ok) = run_fls(
        tmp.path(),
        &["replay", path.to_str().unwrap(), "--output", "json"],
    );
    assert!(!ok);
    assert!(stderr.contains("Failed to parse config file"));
}
