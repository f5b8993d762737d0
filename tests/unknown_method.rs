mod common;

use common::lsp_client::TestClient;

/// Scenario F — unknown method.
#[test]
fn unknown_method_with_id_gets_method_not_found() {
    let mut client = TestClient::spawn();
    client.initialize();

    let response = client.raw_request(
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "textDocument/unknownMethod"
        }),
        2,
    );

    assert_eq!(response["id"], 2);
    assert_eq!(response["error"]["code"], -32601);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("textDocument/unknownMethod"));

    client.shutdown_and_exit();
}

#[test]
fn unknown_notification_is_silently_dropped() {
    let mut client = TestClient::spawn();
    client.initialize();

    client.send(serde_json::json!({
        "jsonrpc": "2.0",
        "method": "workspace/didChangeConfiguration",
        "params": {}
    }));

    // The server should still answer a subsequent real request, proving the
    // unknown notification didn't wedge the dispatch loop.
    let result = client.completion("file:///never-opened.md", 0, 0);
    assert!(result.is_null() || result["items"].as_array().map(|a| a.is_empty()).unwrap_or(true));

    client.shutdown_and_exit();
}
