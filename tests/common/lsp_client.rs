#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// End-to-end test client: spawns the built `gh-aw-ls` binary and speaks
/// framed JSON-RPC over its stdio, the same way a real editor would.
pub struct TestClient {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
}

impl TestClient {
    pub fn spawn() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_gh-aw-ls"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("failed to spawn gh-aw-ls");

        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());

        Self {
            child,
            stdin,
            stdout,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn send(&mut self, message: serde_json::Value) {
        let body = serde_json::to_vec(&message).unwrap();
        write!(self.stdin, "Content-Length: {}\r\n\r\n", body.len()).unwrap();
        self.stdin.write_all(&body).unwrap();
        self.stdin.flush().unwrap();
    }

    pub fn recv(&mut self) -> serde_json::Value {
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            self.stdout.read_line(&mut line).unwrap();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("Content-Length: ") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body = vec![0u8; content_length];
        self.stdout.read_exact(&mut body).unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    pub fn recv_notification(&mut self, method: &str) -> serde_json::Value {
        loop {
            let msg = self.recv();
            if msg["method"].as_str() == Some(method) {
                return msg;
            }
        }
    }

    pub fn initialize(&mut self) -> serde_json::Value {
        let id = self.next_id();
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {}
        }));
        let response = loop {
            let msg = self.recv();
            if msg.get("id") == Some(&serde_json::json!(id)) {
                break msg;
            }
        };
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }));
        response["result"].clone()
    }

    pub fn did_open(&mut self, uri: &str, version: i64, text: &str) {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {
                "textDocument": { "uri": uri, "version": version, "text": text }
            }
        }));
    }

    pub fn did_change(&mut self, uri: &str, version: i64, text: &str) {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [{"text": text}]
            }
        }));
    }

    pub fn did_close(&mut self, uri: &str) {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didClose",
            "params": { "textDocument": { "uri": uri } }
        }));
    }

    pub fn hover(&mut self, uri: &str, line: u32, character: u32) -> serde_json::Value {
        let id = self.next_id();
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/hover",
            "params": {
                "textDocument": { "uri": uri },
                "position": { "line": line, "character": character }
            }
        }));
        self.await_response(id)["result"].clone()
    }

    pub fn completion(&mut self, uri: &str, line: u32, character: u32) -> serde_json::Value {
        let id = self.next_id();
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/completion",
            "params": {
                "textDocument": { "uri": uri },
                "position": { "line": line, "character": character }
            }
        }));
        self.await_response(id)["result"].clone()
    }

    pub fn raw_request(&mut self, message: serde_json::Value, id: i64) -> serde_json::Value {
        self.send(message);
        self.await_response(id)
    }

    fn await_response(&mut self, id: i64) -> serde_json::Value {
        loop {
            let msg = self.recv();
            if msg.get("id") == Some(&serde_json::json!(id)) {
                return msg;
            }
        }
    }

    pub fn shutdown_and_exit(&mut self) {
        let id = self.next_id();
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "shutdown",
            "params": null
        }));
        let _ = self.await_response(id);
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "exit"
        }));
        let _ = self.child.wait();
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
