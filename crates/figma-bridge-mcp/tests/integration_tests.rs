//! Integration tests for the figma-bridge-mcp binary.
//!
//! The binary is driven over its stdio like an MCP client would, and a fake
//! plugin connects to its WebSocket port.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_tungstenite::tungstenite::Message as WsMessage;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

struct McpClient {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl McpClient {
    fn spawn(port: u16) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_figma-bridge-mcp"))
            .args(["--port", &port.to_string(), "--skip-port-cleanup"])
            .env_remove("FIGMA_PAT")
            .env_remove("FIGMA_BRIDGE_PORT")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn figma-bridge-mcp");

        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap()).lines();
        Self {
            child,
            stdin,
            stdout,
            next_id: 1,
        }
    }

    async fn send_line(&mut self, line: &str) {
        self.stdin.write_all(line.as_bytes()).await.unwrap();
        self.stdin.write_all(b"\n").await.unwrap();
        self.stdin.flush().await.unwrap();
    }

    async fn read_response(&mut self) -> Value {
        let line = tokio::time::timeout(RESPONSE_TIMEOUT, self.stdout.next_line())
            .await
            .expect("Timed out waiting for a response")
            .unwrap()
            .expect("Server closed stdout");
        serde_json::from_str(&line).unwrap()
    }

    /// Send a request and return its full JSON-RPC response.
    async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let request = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        self.send_line(&request.to_string()).await;

        let response = self.read_response().await;
        assert_eq!(response["id"], json!(id));
        response
    }

    /// Call a tool and decode the JSON body of its text envelope.
    async fn call_tool(&mut self, name: &str, arguments: Value) -> (Value, bool) {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let result = &response["result"];
        let body = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        (body, result["isError"] == json!(true))
    }

    /// Close stdin and wait for a clean exit.
    async fn shutdown(mut self) {
        drop(self.stdin);
        let status = tokio::time::timeout(RESPONSE_TIMEOUT, self.child.wait())
            .await
            .expect("Server did not exit after stdin closed")
            .unwrap();
        assert!(status.success());
    }
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Port the plugin socket actually bound, once it is up.
async fn bridge_port(client: &mut McpClient) -> u16 {
    for _ in 0..50 {
        let (info, _) = client.call_tool("figma_server_info", json!({})).await;
        if let Some(port) = info["port"].as_u64() {
            return port as u16;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Plugin socket never came up");
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let mut client = McpClient::spawn(free_port());

    let response = client
        .request(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "integration-test", "version": "0"}
            }),
        )
        .await;
    let result = &response["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "figma-mcp-bridge");
    assert!(result["instructions"].as_str().unwrap().contains("Usage Guide"));

    client
        .send_line(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string())
        .await;

    let response = client.request("tools/list", json!({})).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    // 81 plugin commands plus server info and the two comment tools.
    assert_eq!(tools.len(), 84);
    for name in ["figma_get_context", "figma_create_sticky", "figma_get_comments"] {
        assert!(tools.iter().any(|t| t["name"] == name), "missing {}", name);
    }

    // Unparsable input gets a parse error with a null id.
    client.send_line("{oops").await;
    let response = client.read_response().await;
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["id"], Value::Null);

    client.shutdown().await;
}

#[tokio::test]
async fn test_tools_report_not_connected() {
    let mut client = McpClient::spawn(free_port());

    let (body, is_error) = client
        .call_tool("figma_list_pages", json!({}))
        .await;
    assert!(is_error);
    assert_eq!(body["error"]["code"], "NOT_CONNECTED");

    let (body, is_error) = client.call_tool("figma_get_context", json!({})).await;
    assert!(!is_error);
    assert_eq!(body["connected"], json!(false));

    let (body, is_error) = client.call_tool("figma_get_comments", json!({})).await;
    assert!(is_error);
    assert_eq!(body["error"]["code"], "PAT_NOT_CONFIGURED");

    let response = client
        .request("tools/call", json!({"name": "figma_nope", "arguments": {}}))
        .await;
    assert_eq!(response["error"]["code"], json!(-32602));

    client.shutdown().await;
}

#[tokio::test]
async fn test_plugin_roundtrip() {
    let mut client = McpClient::spawn(free_port());
    let port = bridge_port(&mut client).await;

    let (mut plugin, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{}/", port))
        .await
        .expect("Plugin failed to connect");
    plugin
        .send(WsMessage::Text(
            json!({"type": "handshake", "payload": {"fileName": "Demo", "fileId": "abc"}}).to_string(),
        ))
        .await
        .unwrap();

    let ack = match plugin.next().await.unwrap().unwrap() {
        WsMessage::Text(text) => serde_json::from_str::<Value>(&text).unwrap(),
        other => panic!("unexpected frame {:?}", other),
    };
    assert_eq!(ack["type"], "handshake_ack");
    assert!(ack["payload"]["sessionId"].as_str().unwrap().starts_with("sess_"));

    // Answer every command the bridge sends, skipping heartbeats.
    let responder = tokio::spawn(async move {
        while let Some(Ok(frame)) = plugin.next().await {
            let WsMessage::Text(text) = frame else { continue };
            let request: Value = serde_json::from_str(&text).unwrap();
            let Some(request_id) = request.get("requestId") else { continue };
            let payload = match request["command"].as_str() {
                Some("get_context") => json!({"fileName": "Demo", "currentPage": "Page 1", "selection": []}),
                Some("list_pages") => json!({"pages": [{"id": "0:1", "name": "Page 1"}]}),
                _ => json!({"error": {"code": "UNSUPPORTED", "message": "Not in this fake"}}),
            };
            let reply = json!({"responseTo": request_id, "payload": payload});
            if plugin.send(WsMessage::Text(reply.to_string())).await.is_err() {
                break;
            }
        }
    });

    let (body, is_error) = client.call_tool("figma_get_context", json!({})).await;
    assert!(!is_error);
    assert_eq!(body["connected"], json!(true));
    assert_eq!(body["fileName"], "Demo");

    let (body, is_error) = client.call_tool("figma_list_pages", json!({})).await;
    assert!(!is_error);
    assert_eq!(body["pages"][0]["name"], "Page 1");

    let (body, is_error) = client
        .call_tool("figma_set_text", json!({"nodeId": "1:1", "text": "Hi"}))
        .await;
    assert!(is_error);
    assert_eq!(body["error"]["code"], "UNSUPPORTED");

    let (info, _) = client.call_tool("figma_server_info", json!({})).await;
    assert_eq!(info["connected"], json!(true));
    assert_eq!(info["documentInfo"]["fileName"], "Demo");

    client.shutdown().await;
    responder.abort();
}
