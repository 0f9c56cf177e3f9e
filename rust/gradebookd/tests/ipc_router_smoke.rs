use serde_json::json;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn fixture_text(rel: &str) -> String {
    let p = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel);
    fs::read_to_string(&p).expect("read fixture")
}

fn spawn_sidecar_with_env(vars: &[(&str, &str)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut cmd = Command::new(exe);
    cmd.env_remove("GRADEBOOKD_TARGET_GRADE")
        .env_remove("GRADEBOOKD_FINAL_WEIGHT")
        .env_remove("GRADEBOOKD_EXTRACT_ATTEMPTS")
        .env_remove("GRADEBOOKD_EXTRACT_DELAY_MS");
    for (k, v) in vars {
        cmd.env(k, v);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with_env(&[])
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["result"]["version"], json!(env!("CARGO_PKG_VERSION")));
    assert_eq!(health["result"]["defaults"]["targetGrade"], json!("A"));
    assert_eq!(health["result"]["extractRetry"]["maxAttempts"], json!(3));
    assert_eq!(health["result"]["extractRetry"]["initialDelayMs"], json!(2000));

    let fenced = format!("```json\n{}\n```", fixture_text("canvas_page1.json"));
    let parsed = request(
        &mut stdin,
        &mut reader,
        "2",
        "extract.parse",
        json!({ "text": fenced }),
    );
    assert_eq!(parsed["ok"], json!(true));
    let page1 = parsed["result"]["record"].clone();
    assert_eq!(page1["letterGrade"], json!("A-"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.merge",
        json!({ "records": [page1.clone(), page1.clone()] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "grades.summary",
        json!({ "record": page1.clone() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "grades.project",
        json!({ "record": page1, "targetGrade": "B" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "grades.analyze",
        json!({ "responses": [fixture_text("canvas_page1.json")] }),
    );

    let unknown = {
        writeln!(stdin, "{}", json!({ "id": "7", "method": "grades.delete" })).expect("write");
        stdin.flush().expect("flush");
        read_response(&mut reader)
    };
    assert_eq!(unknown["id"], json!("7"));
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bad_json_lines_get_an_error_without_stopping_the_loop() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    writeln!(stdin).expect("write blank line");
    stdin.flush().expect("flush");
    let garbage = read_response(&mut reader);
    assert_eq!(garbage["ok"], json!(false));
    assert_eq!(garbage["error"]["code"], json!("bad_json"));
    assert!(garbage.get("id").is_none());

    let health = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert_eq!(health["ok"], json!(true));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn analyze_parses_merges_and_projects() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.analyze",
        json!({
            "responses": [
                fixture_text("canvas_page1.json"),
                format!("```\n{}\n```", fixture_text("canvas_page2.json"))
            ],
            "targetGrade": "B",
            "finalWeight": 25
        }),
    );
    assert_eq!(res["ok"], json!(true), "{}", res);
    let result = &res["result"];
    assert_eq!(result["screenshots"], json!(2));
    assert_eq!(result["record"]["letterGrade"], json!("B"));
    assert_eq!(result["record"]["assignments"].as_array().map(|a| a.len()), Some(4));

    // (83 - 83.33.. * 0.75) / 0.25 = 82
    let needed = result["projection"]["neededScore"].as_f64().expect("neededScore");
    assert!((needed - 82.0).abs() < 1e-9, "needed {}", needed);
    assert_eq!(result["projection"]["isPossible"], json!(true));
    assert_eq!(result["suggestedTarget"], json!(null));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn analyze_reports_which_reply_failed() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.analyze",
        json!({
            "responses": [fixture_text("canvas_page1.json"), "I could not read this image."]
        }),
    );
    assert_eq!(res["ok"], json!(false));
    assert_eq!(res["error"]["code"], json!("extract_failed"));
    assert_eq!(res["error"]["details"]["index"], json!(1));
    assert_eq!(res["error"]["details"]["retryable"], json!(false));

    let none = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.analyze",
        json!({ "responses": [] }),
    );
    assert_eq!(none["error"]["code"], json!("empty_input"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn environment_overrides_request_defaults() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[
        ("GRADEBOOKD_TARGET_GRADE", "B"),
        ("GRADEBOOKD_FINAL_WEIGHT", "50"),
    ]);

    let res = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.project",
        json!({
            "record": {
                "className": "CS 101",
                "currentGrade": 70,
                "letterGrade": "C",
                "gradingScale": { "A": 90, "B": 80 }
            }
        }),
    );
    let p = &res["result"]["projection"];
    assert_eq!(p["targetGrade"], json!("B"));
    assert_eq!(p["finalWeight"], json!(50.0));
    // (80 - 70 * 0.5) / 0.5 = 90
    assert_eq!(p["neededScore"], json!(90.0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn invalid_environment_fails_startup() {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let status = Command::new(exe)
        .env("GRADEBOOKD_FINAL_WEIGHT", "lots")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run gradebookd");
    assert_eq!(status.code(), Some(2));
}
