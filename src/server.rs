use std::io::{BufRead, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::completion::handle_completion;
use crate::diagnostics::validate_document;
use crate::document::DocumentStore;
use crate::hover::handle_hover;
use crate::protocol::{
    DidChangeParams, DidCloseParams, DidOpenParams, IncomingMessage, OutgoingNotification,
    OutgoingResponse, RequestId, TextDocumentPositionParams, METHOD_NOT_FOUND,
};
use crate::schema::SchemaProvider;
use crate::transport::{Transport, TransportError};

/// Holds the shared collaborators — a document store and a schema provider
/// — behind a hand-rolled transport, and dispatches each incoming message to
/// `hover`/`completion`/`diagnostics` in turn.
pub struct Server<R, W> {
    transport: Transport<R, W>,
    documents: DocumentStore,
    schema: Arc<SchemaProvider>,
    shutting_down: bool,
}

impl<R: BufRead, W: Write> Server<R, W> {
    /// Construct the server, failing fast if the embedded schema cannot be
    /// parsed rather than deferring the failure into the dispatch loop.
    pub fn new(reader: R, writer: W) -> anyhow::Result<Self> {
        let schema = SchemaProvider::new()?;
        Ok(Self {
            transport: Transport::new(reader, writer),
            documents: DocumentStore::new(),
            schema: Arc::new(schema),
            shutting_down: false,
        })
    }

    /// Run until `exit`, clean EOF after `shutdown`, or a transport error.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let message = match self.transport.read_message() {
                Ok(m) => m,
                Err(TransportError::Eof) if self.shutting_down => {
                    info!("transport closed after shutdown, exiting cleanly");
                    return Ok(());
                }
                Err(err) => {
                    error!("fatal transport error: {err}");
                    return Err(err.into());
                }
            };

            if self.dispatch(&message)? {
                return Ok(());
            }
        }
    }

    /// Returns `Ok(true)` when the loop should stop (an `exit` notification).
    fn dispatch(&mut self, message: &IncomingMessage) -> anyhow::Result<bool> {
        let Some(method) = message.method.as_deref() else {
            return Ok(false);
        };
        debug!("dispatching {method}");

        match method {
            "initialize" => self.respond(message, initialize_result()),
            "initialized" => {}
            "shutdown" => {
                self.shutting_down = true;
                self.respond(message, Value::Null);
            }
            "exit" => return Ok(true),
            "textDocument/didOpen" => self.on_did_open(message),
            "textDocument/didChange" => self.on_did_change(message),
            "textDocument/didClose" => self.on_did_close(message),
            "textDocument/hover" => self.on_hover(message),
            "textDocument/completion" => self.on_completion(message),
            other => {
                if let Some(id) = &message.id {
                    warn!("unknown method with id: {other}");
                    self.write_response(OutgoingResponse::failure(
                        id.clone(),
                        METHOD_NOT_FOUND,
                        format!("Method not found: {other}"),
                    ));
                } else {
                    debug!("ignoring unknown notification: {other}");
                }
            }
        }

        Ok(false)
    }

    fn respond(&mut self, message: &IncomingMessage, result: Value) {
        if let Some(id) = &message.id {
            self.write_response(OutgoingResponse::success(id.clone(), result));
        }
    }

    fn write_response(&mut self, response: OutgoingResponse) {
        if let Err(err) = self.transport.write_message(&response) {
            error!("failed to write response: {err}");
        }
    }

    fn on_did_open(&mut self, message: &IncomingMessage) {
        let Some(params) = parse_params::<DidOpenParams>(message) else {
            return;
        };
        let uri = params.text_document.uri;
        info!("didOpen {uri}");
        self.documents
            .open(uri.clone(), params.text_document.version, params.text_document.text);
        self.publish_diagnostics(&uri);
    }

    fn on_did_change(&mut self, message: &IncomingMessage) {
        let Some(params) = parse_params::<DidChangeParams>(message) else {
            return;
        };
        let uri = params.text_document.uri;
        let Some(last_change) = params.content_changes.into_iter().last() else {
            return;
        };
        info!("didChange {uri} v{}", params.text_document.version);
        self.documents
            .update(uri.clone(), params.text_document.version, last_change.text);
        self.publish_diagnostics(&uri);
    }

    fn on_did_close(&mut self, message: &IncomingMessage) {
        let Some(params) = parse_params::<DidCloseParams>(message) else {
            return;
        };
        let uri = params.text_document.uri;
        info!("didClose {uri}");
        self.documents.close(&uri);
        self.write_notification(OutgoingNotification::new(
            "textDocument/publishDiagnostics",
            json!({ "uri": uri, "diagnostics": Vec::<Value>::new() }),
        ));
    }

    fn on_hover(&mut self, message: &IncomingMessage) {
        let Some(params) = parse_params::<TextDocumentPositionParams>(message) else {
            return;
        };
        let snapshot = self.documents.get(&params.text_document.uri);
        let hover = handle_hover(snapshot.as_deref(), params.position, &self.schema);
        self.respond(message, serde_json::to_value(hover).unwrap_or(Value::Null));
    }

    fn on_completion(&mut self, message: &IncomingMessage) {
        let Some(params) = parse_params::<TextDocumentPositionParams>(message) else {
            return;
        };
        let snapshot = self.documents.get(&params.text_document.uri);
        let items = handle_completion(snapshot.as_deref(), params.position, &self.schema);
        self.respond(message, json!({ "isIncomplete": false, "items": items }));
    }

    fn publish_diagnostics(&mut self, uri: &str) {
        let Some(snapshot) = self.documents.get(uri) else {
            return;
        };
        let diagnostics = validate_document(&snapshot, &self.schema);
        self.write_notification(OutgoingNotification::new(
            "textDocument/publishDiagnostics",
            json!({ "uri": uri, "diagnostics": diagnostics }),
        ));
    }

    fn write_notification(&mut self, notification: OutgoingNotification) {
        if let Err(err) = self.transport.write_message(&notification) {
            error!("failed to write notification: {err}");
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(message: &IncomingMessage) -> Option<T> {
    let params = message.params.clone()?;
    match serde_json::from_value(params) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!("failed to parse params for {:?}: {err}", message.method);
            None
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "serverInfo": { "name": "gh-aw-ls", "version": env!("CARGO_PKG_VERSION") },
        "capabilities": {
            "textDocumentSync": 1,
            "hoverProvider": true,
            "completionProvider": { "triggerCharacters": [":", " ", "\n"] }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(body: &str) -> Vec<u8> {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
    }

    fn run_with_input(input: Vec<u8>) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut server = Server::new(Cursor::new(input), &mut out).unwrap();
            let _ = server.run();
        }
        out
    }

    #[test]
    fn initialize_then_exit_produces_one_response() {
        let mut input = frame(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        input.extend(frame(r#"{"jsonrpc":"2.0","method":"exit"}"#));
        let out = run_with_input(input);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"id\":1"));
        assert!(text.contains("hoverProvider"));
    }

    #[test]
    fn unknown_method_with_id_gets_method_not_found() {
        let mut input = frame(
            r#"{"jsonrpc":"2.0","id":2,"method":"textDocument/unknownMethod"}"#,
        );
        input.extend(frame(r#"{"jsonrpc":"2.0","method":"exit"}"#));
        let out = run_with_input(input);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"id\":2"));
        assert!(text.contains("-32601"));
    }

    #[test]
    fn shutdown_then_eof_exits_cleanly() {
        let input = frame(r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#);
        let mut out = Vec::new();
        let mut server = Server::new(Cursor::new(input), &mut out).unwrap();
        assert!(server.run().is_ok());
    }
}
