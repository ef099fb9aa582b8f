//! End-to-end checks of the HTTP adapters against an in-memory media center.

#![cfg(feature = "http")]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use kodi_mcp_server::core::transport::{HttpConfig, build_router};
use kodi_mcp_server::core::{Config, McpServer};
use kodi_mcp_server::domains::backend::{
    BackendError, LibraryType, MediaCenter, NavigationDirection,
};
use kodi_mcp_server::domains::media::MediaLibrary;
use kodi_mcp_server::domains::tools::{ToolContext, build_tool_registry};

#[derive(Default)]
struct RecordingKodi {
    calls: Mutex<Vec<String>>,
}

impl RecordingKodi {
    fn record(&self, call: String) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(call);
        Ok(json!("OK"))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaCenter for RecordingKodi {
    async fn ping(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn playback_state(&self) -> Result<Value, BackendError> {
        Ok(json!({ "status": "nothing_playing" }))
    }

    async fn play_pause(&self) -> Result<Value, BackendError> {
        self.record("play_pause".to_string())
    }

    async fn stop(&self) -> Result<Value, BackendError> {
        self.record("stop".to_string())
    }

    async fn set_volume(&self, level: u8) -> Result<Value, BackendError> {
        self.record(format!("set_volume:{}", level))
    }

    async fn navigate(&self, direction: NavigationDirection) -> Result<Value, BackendError> {
        self.record(format!("navigate:{}", direction))
    }

    async fn search_movies(&self, query: &str) -> Result<Value, BackendError> {
        self.record(format!("search_movies:{}", query))
    }

    async fn recent_movies(&self, limit: u32) -> Result<Value, BackendError> {
        self.record(format!("recent_movies:{}", limit))
    }

    async fn tv_shows(&self) -> Result<Value, BackendError> {
        self.record("tv_shows".to_string())
    }

    async fn play_movie(&self, movie_id: i64) -> Result<Value, BackendError> {
        self.record(format!("play_movie:{}", movie_id))
    }

    async fn play_episode(
        &self,
        tvshow_id: i64,
        season: i64,
        episode: i64,
    ) -> Result<Value, BackendError> {
        self.record(format!("play_episode:{}:{}:{}", tvshow_id, season, episode))
    }

    async fn library_stats(&self) -> Result<Value, BackendError> {
        Ok(json!({ "movies": 3, "tvshows": 1, "episodes": 10 }))
    }

    async fn scan_library(&self, library: LibraryType) -> Result<Value, BackendError> {
        self.record(format!("scan_library:{}", library))
    }

    async fn play_file(&self, path: &str) -> Result<Value, BackendError> {
        self.record(format!("play_file:{}", path))
    }
}

const WAIT: Duration = Duration::from_secs(5);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn app_with(downloads: &Path, kodi: Arc<RecordingKodi>, http: &HttpConfig) -> Router {
    let backend: Arc<dyn MediaCenter> = kodi;
    let context = ToolContext::new(backend.clone(), MediaLibrary::new(downloads));
    let registry = build_tool_registry(context).unwrap();
    let server = McpServer::new(Config::default(), registry, backend);
    build_router(server, http)
}

fn app(downloads: &Path, kodi: Arc<RecordingKodi>) -> Router {
    app_with(downloads, kodi, &HttpConfig::default())
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"video").unwrap();
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn rest_call(app: &Router, tool: &str, params: Value) -> (StatusCode, Value) {
    let request = Request::post(format!("/tools/{}", tool))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "params": params }).to_string()))
        .unwrap();
    send(app, request).await
}

async fn rpc(app: &Router, message: Value) -> (StatusCode, Value) {
    let request = Request::post("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(message.to_string()))
        .unwrap();
    send(app, request).await
}

// ============================================================================
// REST
// ============================================================================

#[tokio::test]
async fn test_rest_lists_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (status, body) = send(&app, Request::get("/tools").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 16);
    assert_eq!(tools[0]["name"], "get_now_playing");
}

#[tokio::test]
async fn test_rest_status_codes() {
    let dir = tempfile::tempdir().unwrap();
    let kodi = Arc::new(RecordingKodi::default());
    let app = app(dir.path(), kodi.clone());

    let (status, body) = rest_call(&app, "set_volume", json!({ "level": 40 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tool"], "set_volume");

    let (status, body) = rest_call(&app, "rewind_time", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "UNKNOWN_TOOL");

    let (status, body) = rest_call(&app, "play_movie", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "MISSING_PARAMETER");

    assert_eq!(kodi.calls(), vec!["set_volume:40"]);
}

#[tokio::test]
async fn test_rest_rejects_non_object_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let request = Request::post("/tools/player_stop")
        .body(Body::from("[1, 2, 3]"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_PARAMETER_TYPE");
}

#[tokio::test]
async fn test_health_reports_backend() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "ok");
}

// ============================================================================
// JSON-RPC
// ============================================================================

#[tokio::test]
async fn test_rpc_initialize_list_and_call() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (_, init) = rpc(
        &app,
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
    )
    .await;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

    let (_, list) = rpc(
        &app,
        json!({ "jsonrpc": "2.0", "id": "list", "method": "tools/list" }),
    )
    .await;
    assert_eq!(list["id"], "list");
    assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 16);

    let (_, call) = rpc(
        &app,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": "get_library_stats", "arguments": {} }
        }),
    )
    .await;
    assert_eq!(call["id"], 7);
    assert_eq!(call["result"]["isError"], false);
    assert_eq!(call["result"]["structuredContent"]["data"]["movies"], 3);
}

#[tokio::test]
async fn test_rpc_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (_, unknown) = rpc(
        &app,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "rewind_time" }
        }),
    )
    .await;
    assert_eq!(unknown["error"]["code"], -32601);

    let (_, method) = rpc(&app, json!({ "jsonrpc": "2.0", "id": 3, "method": "nope" })).await;
    assert_eq!(method["error"]["code"], -32601);

    let request = Request::post("/mcp").body(Body::from("{not json")).unwrap();
    let (_, parse) = send(&app, request).await;
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);
}

#[tokio::test]
async fn test_rpc_invalid_request_echoes_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (_, reply) = rpc(&app, json!({ "id": 9, "method": "ping" })).await;

    assert_eq!(reply["error"]["code"], -32600);
    assert_eq!(reply["id"], 9);
}

#[tokio::test]
async fn test_rpc_batch_and_notifications() {
    let dir = tempfile::tempdir().unwrap();
    let kodi = Arc::new(RecordingKodi::default());
    let app = app(dir.path(), kodi.clone());

    let (status, replies) = rpc(
        &app,
        json!([
            { "jsonrpc": "2.0", "id": 1, "method": "ping" },
            { "jsonrpc": "2.0", "method": "notifications/initialized" },
            { "jsonrpc": "2.0", "id": 2, "method": "tools/call",
              "params": { "name": "player_stop", "arguments": {} } }
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let replies = replies.as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[1]["id"], 2);
    assert!(replies[1].get("error").is_none(), "{}", replies[1]);
    assert_eq!(replies[1]["result"]["isError"], false);

    let (status, body) = rpc(
        &app,
        json!([{ "jsonrpc": "2.0", "method": "notifications/initialized" }]),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);

    assert_eq!(kodi.calls(), vec!["stop"]);
}

#[tokio::test]
async fn test_rest_and_rpc_listings_agree() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let (_, rest) = send(&app, Request::get("/tools").body(Body::empty()).unwrap()).await;
    let (_, listed) = rpc(&app, json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })).await;

    let rest_tools = rest["tools"].as_array().unwrap();
    let rpc_tools = listed["result"]["tools"].as_array().unwrap();
    assert_eq!(rest_tools.len(), rpc_tools.len());

    for (rest_tool, rpc_tool) in rest_tools.iter().zip(rpc_tools) {
        assert_eq!(rest_tool["name"], rpc_tool["name"]);
        assert_eq!(rest_tool["description"], rpc_tool["description"]);

        let schema = &rpc_tool["inputSchema"];
        let parameters = rest_tool["parameters"].as_array().unwrap();
        let required: Vec<&Value> = parameters
            .iter()
            .filter(|p| p["required"] == true)
            .map(|p| &p["name"])
            .collect();
        let schema_required: Vec<&Value> = schema["required"]
            .as_array()
            .map(|r| r.iter().collect())
            .unwrap_or_default();
        assert_eq!(required, schema_required, "tool {}", rest_tool["name"]);

        for param in parameters {
            let name = param["name"].as_str().unwrap();
            assert_eq!(schema["properties"][name]["type"], param["type"]);
        }
    }
}

// ============================================================================
// SSE
// ============================================================================

#[tokio::test]
async fn test_sse_starts_with_ready_event() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let response = app
        .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let chunk = frame.into_data().unwrap();
    let text = String::from_utf8_lossy(&chunk);

    assert!(text.contains("event: ready"), "{}", text);
    assert!(text.contains("get_now_playing"), "{}", text);
}

async fn next_sse_frame(body: &mut Body) -> String {
    let frame = timeout(WAIT, body.frame())
        .await
        .expect("no SSE frame in time")
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&frame.into_data().unwrap()).into_owned()
}

#[tokio::test]
async fn test_sse_pushes_tool_executed_events() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());

    let response = app
        .clone()
        .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut body = response.into_body();
    assert!(next_sse_frame(&mut body).await.contains("event: ready"));

    let (status, _) = rest_call(&app, "player_stop", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let text = next_sse_frame(&mut body).await;
    assert!(text.contains("event: tool_executed"), "{}", text);
    assert!(text.contains("\"tool\":\"player_stop\""), "{}", text);
    assert!(text.contains("\"success\":true"), "{}", text);
}

#[tokio::test]
async fn test_sse_polls_playback_state_silently() {
    let dir = tempfile::tempdir().unwrap();
    let http = HttpConfig {
        sse_interval_secs: 1,
        ..HttpConfig::default()
    };
    let app = app_with(dir.path(), Arc::default(), &http);

    let response = app
        .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut body = response.into_body();
    assert!(next_sse_frame(&mut body).await.contains("event: ready"));

    // Polling goes through the registry but must not announce itself as a call.
    for _ in 0..2 {
        let text = next_sse_frame(&mut body).await;
        assert!(text.contains("event: playback_state"), "{}", text);
        assert!(text.contains("nothing_playing"), "{}", text);
    }
}

// ============================================================================
// WebSocket
// ============================================================================

async fn connect(app: Router) -> Socket {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    socket
}

async fn send_ws(socket: &mut Socket, message: Value) {
    socket.send(Message::text(message.to_string())).await.unwrap();
}

async fn next_ws_json(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("no WebSocket message in time")
            .unwrap()
            .unwrap();
        if message.is_text() {
            return serde_json::from_str(message.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_ws_sequential_calls_on_one_connection() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Avengers.Endgame.1080p.BluRay.mkv");
    let kodi = Arc::new(RecordingKodi::default());
    let mut socket = connect(app(dir.path(), kodi.clone())).await;

    send_ws(
        &mut socket,
        json!({ "jsonrpc": "2.0", "id": "a", "method": "tools/list" }),
    )
    .await;
    let listed = next_ws_json(&mut socket).await;
    assert_eq!(listed["id"], "a");
    assert_eq!(listed["result"]["tools"].as_array().unwrap().len(), 16);

    send_ws(
        &mut socket,
        json!({
            "jsonrpc": "2.0",
            "id": "b",
            "method": "tools/call",
            "params": { "name": "find_and_play", "arguments": { "query": "avengers" } }
        }),
    )
    .await;
    let played = next_ws_json(&mut socket).await;
    assert_eq!(played["id"], "b");
    assert_eq!(played["result"]["isError"], false);

    let event = next_ws_json(&mut socket).await;
    assert_eq!(event["method"], "notifications/tools/tool_executed");
    assert!(event.get("id").is_none());
    assert_eq!(event["params"]["tool"], "find_and_play");
    assert_eq!(event["params"]["success"], true);

    send_ws(
        &mut socket,
        json!({
            "jsonrpc": "2.0",
            "id": "c",
            "method": "tools/call",
            "params": { "name": "set_volume", "arguments": { "level": 150 } }
        }),
    )
    .await;
    let rejected = next_ws_json(&mut socket).await;
    assert_eq!(rejected["id"], "c");
    assert_eq!(rejected["error"]["code"], -32602);

    let calls = kodi.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("play_file:"));
}

#[tokio::test]
async fn test_ws_forwards_events_from_other_transports() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), Arc::default());
    let mut socket = connect(app.clone()).await;

    // Round trip first so the socket is subscribed before the REST call.
    send_ws(&mut socket, json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" })).await;
    assert_eq!(next_ws_json(&mut socket).await["id"], 1);

    rest_call(&app, "player_play_pause", json!({})).await;

    let event = next_ws_json(&mut socket).await;
    assert_eq!(event["method"], "notifications/tools/tool_executed");
    assert_eq!(event["params"]["tool"], "player_play_pause");
}

// ============================================================================
// Find-and-play scenarios
// ============================================================================

#[tokio::test]
async fn test_best_match_prefers_release_over_sample() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Avengers.Endgame.1080p.BluRay.mkv");
    touch(dir.path(), "Avengers.Endgame.SAMPLE.mkv");
    let kodi = Arc::new(RecordingKodi::default());
    let app = app(dir.path(), kodi.clone());

    let (status, body) = rest_call(&app, "find_and_play", json!({ "query": "avengers endgame" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["best_match"]["name"],
        "Avengers.Endgame.1080p.BluRay.mkv"
    );
    assert_eq!(body["data"]["auto_played"], true);
    let played = kodi.calls();
    assert_eq!(played.len(), 1);
    assert!(played[0].ends_with("Avengers.Endgame.1080p.BluRay.mkv"));
}

#[tokio::test]
async fn test_only_candidate_wins_despite_penalty() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Trailer.Batman.mkv");
    let app = app(dir.path(), Arc::default());

    let (status, body) = rest_call(
        &app,
        "find_and_play",
        json!({ "query": "batman", "auto_play": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["best_match"]["name"], "Trailer.Batman.mkv");
    assert_eq!(body["data"]["auto_played"], false);
}

#[tokio::test]
async fn test_empty_directory_has_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let kodi = Arc::new(RecordingKodi::default());
    let app = app(dir.path(), kodi.clone());

    let (status, body) = rest_call(&app, "find_and_play", json!({ "query": "anything" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "NO_MATCH_FOUND");
    assert!(kodi.calls().is_empty());
}

#[tokio::test]
async fn test_out_of_range_volume_never_reaches_backend() {
    let dir = tempfile::tempdir().unwrap();
    let kodi = Arc::new(RecordingKodi::default());
    let app = app(dir.path(), kodi.clone());

    let (status, body) = rest_call(&app, "set_volume", json!({ "level": 150 })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_PARAMETER_VALUE");
    assert!(kodi.calls().is_empty());
}
