//! Server-Sent Events adapter.
//!
//! Push-only stream: a `ready` event on connect, then `tool_executed` events
//! for calls made through any transport and periodic `playback_state`
//! snapshots. Clients cannot call tools on this channel.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tracing::{info, warn};

use super::http::AppState;
use crate::core::{McpServer, ServerEvent};

/// Tool polled for `playback_state` events.
const PLAYBACK_TOOL: &str = "get_now_playing";

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| {
            warn!("Failed to encode {} event: {}", name, e);
            Event::default().event("error").data(e.to_string())
        })
}

fn ready_event(server: &McpServer) -> Event {
    json_event(
        "ready",
        &json!({
            "server": server.name(),
            "version": server.version(),
            "tools": server.registry().tool_names(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// Events published by tool calls, skipping whatever a slow client missed.
fn tool_events(
    events: broadcast::Receiver<ServerEvent>,
) -> impl Stream<Item = Event> + Send + 'static {
    BroadcastStream::new(events).filter_map(|received| async move {
        match received {
            Ok(event) => Some(json_event(event.name(), &event)),
            Err(e) => {
                warn!("SSE client lagging: {}", e);
                None
            }
        }
    })
}

/// Periodic playback snapshots obtained through the tool registry.
fn playback_events(server: McpServer, every: Duration) -> impl Stream<Item = Event> + Send + 'static {
    IntervalStream::new(interval_at(Instant::now() + every, every)).then(move |_| {
        let server = server.clone();
        async move {
            let output = server.poll_tool(PLAYBACK_TOOL, Value::Null).await;
            json_event("playback_state", &output)
        }
    })
}

/// `GET /sse`.
pub async fn handle_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let server = state.server;
    info!(
        "SSE client connected ({} subscribers)",
        server.events().subscriber_count() + 1
    );

    let live = stream::select(
        tool_events(server.events().subscribe()),
        playback_events(server.clone(), state.sse_interval),
    );
    let events = stream::once(async move { ready_event(&server) })
        .chain(live)
        .map(Ok::<_, Infallible>);

    Sse::new(events).keep_alive(KeepAlive::default())
}
