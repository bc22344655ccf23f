//! MCP JSON-RPC integration tests.
//!
//! These tests spawn `wordfreq --mcp` as a child process and communicate
//! via stdin/stdout using newline-delimited JSON-RPC (rmcp's stdio transport).
//! Only tools that need no network are called.

#![cfg(all(feature = "cli", feature = "mcp"))]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

fn wordfreq_binary() -> String {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("target");
    path.push("debug");
    path.push("wordfreq");
    path.to_string_lossy().into_owned()
}

fn send_jsonrpc(stdin: &mut impl Write, msg: &Value) {
    let body = serde_json::to_string(msg).unwrap();
    writeln!(stdin, "{body}").unwrap();
    stdin.flush().unwrap();
}

fn read_jsonrpc_line(reader: &mut BufReader<impl std::io::Read>) -> Option<Value> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return read_jsonrpc_line(reader); // skip blank lines
            }
            serde_json::from_str(trimmed).ok()
        }
        Err(_) => None,
    }
}

/// Spawn the MCP server, send requests, collect responses.
fn mcp_session(requests: Vec<Value>) -> Vec<Value> {
    let bin = wordfreq_binary();
    let mut child = Command::new(&bin)
        .arg("--mcp")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn {bin}: {e}"));

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let mut reader = BufReader::new(stdout);

    let mut responses = Vec::new();
    for req in &requests {
        send_jsonrpc(&mut stdin, req);
        // Only read a response for requests with an "id" (not notifications)
        if req.get("id").is_some() {
            if let Some(resp) = read_jsonrpc_line(&mut reader) {
                responses.push(resp);
            }
        }
    }

    drop(stdin);
    let _ = child.wait();
    responses
}

fn initialize() -> Vec<Value> {
    vec![
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.1.0"}
            }
        }),
        // initialized notification (no id)
        json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }),
    ]
}

fn call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

/// Parse the JSON text payload of a tools/call response.
fn payload(responses: &[Value], id: u64) -> Value {
    let resp = responses
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("no response for id {id}: {responses:?}"));
    let content = &resp["result"]["content"][0];
    assert_eq!(content["type"], "text");
    serde_json::from_str(content["text"].as_str().unwrap()).unwrap()
}

#[test]
fn mcp_initialize_returns_server_info() {
    let responses = mcp_session(initialize());

    assert!(!responses.is_empty(), "No response received");
    let resp = &responses[0];
    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    let result = &resp["result"];
    assert!(result.get("serverInfo").is_some());
    assert_eq!(result["serverInfo"]["name"], "wordfreq");
}

#[test]
fn mcp_tools_list_has_all_tools() {
    let mut requests = initialize();
    requests.push(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/list",
        "params": {}
    }));
    let responses = mcp_session(requests);

    let tools_resp = responses.iter().find(|r| r["id"] == 2).unwrap();
    let tools = tools_resp["result"]["tools"].as_array().unwrap();
    let tool_names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    let expected = [
        "select_method",
        "session",
        "load_title",
        "load_url",
        "load_pdf",
        "load_text",
        "analyze",
        "table_page",
        "keywords",
        "export_csv",
        "resolve_title",
        "normalize_url",
    ];
    for name in &expected {
        assert!(
            tool_names.contains(name),
            "Missing tool: {name}. Found: {tool_names:?}"
        );
    }
    assert_eq!(tool_names.len(), expected.len());
}

#[test]
fn mcp_load_analyze_export() {
    let mut requests = initialize();
    requests.push(call(
        2,
        "load_text",
        json!({"text": "The cat sat on the mat. The cat ran."}),
    ));
    requests.push(call(3, "analyze", json!({})));
    requests.push(call(4, "export_csv", json!({})));
    requests.push(call(5, "table_page", json!({"page": 2})));
    let responses = mcp_session(requests);

    let loaded = payload(&responses, 2);
    assert_eq!(loaded["status"], "loaded");
    assert_eq!(loaded["method"], "paste");

    let analyzed = payload(&responses, 3);
    assert_eq!(analyzed["status"], "analyzed");
    assert_eq!(analyzed["report"]["rows"][0]["word"], "cat");
    assert_eq!(analyzed["report"]["rows"][0]["percentage"], 40.0);
    assert_eq!(analyzed["page"]["page_count"], 1);

    let exported = payload(&responses, 4);
    assert!(exported["data_uri"]
        .as_str()
        .unwrap()
        .starts_with("data:file/csv;base64,"));
    assert!(exported["csv"].as_str().unwrap().contains("1,cat,2,40.0 %"));

    let page = payload(&responses, 5);
    assert!(page["rows"].as_array().unwrap().is_empty());
}

#[test]
fn mcp_select_method_hides_loaded_text() {
    let mut requests = initialize();
    requests.push(call(2, "load_text", json!({"text": "whales and oceans"})));
    requests.push(call(3, "select_method", json!({"method": "url"})));
    requests.push(call(4, "analyze", json!({})));
    requests.push(call(5, "session", json!({})));
    let responses = mcp_session(requests);

    assert_eq!(payload(&responses, 4)["status"], "no_text");
    let state = payload(&responses, 5);
    assert_eq!(state["selected"], "url");
    assert_eq!(state["loaded_method"], "paste");
    assert_eq!(state["text_visible"], false);
}

#[test]
fn mcp_load_pdf_missing_file_fails_softly() {
    let mut requests = initialize();
    requests.push(call(
        2,
        "load_pdf",
        json!({"path": "/nonexistent/wordfreq-test.pdf"}),
    ));
    let responses = mcp_session(requests);
    assert_eq!(payload(&responses, 2)["status"], "failed");
}

#[test]
fn mcp_tools_call_normalize_url() {
    let mut requests = initialize();
    requests.push(call(
        2,
        "normalize_url",
        json!({"url": "https://www.Example.COM:443/path?utm_source=test&id=1"}),
    ));
    let responses = mcp_session(requests);

    let parsed = payload(&responses, 2);
    let key = parsed["cache_key"].as_str().unwrap();
    assert!(!key.contains("utm_source"));
    assert!(!key.contains("www."));
    assert!(key.contains("id=1"));
}
