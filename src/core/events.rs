//! Server-originated events.
//!
//! Every tool execution is published on a broadcast channel so push
//! transports (SSE, WebSocket) can forward it to their clients. Publishing
//! never blocks; slow subscribers miss events instead of holding up calls.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::domains::tools::{ToolErrorKind, ToolOutput};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 256;

/// An event pushed to streaming clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A tool finished, through any transport.
    ToolExecuted {
        tool: String,
        success: bool,
        error_code: Option<ToolErrorKind>,
        duration_ms: u64,
        timestamp: String,
    },
}

impl ServerEvent {
    /// Build the event describing a finished tool call.
    pub fn tool_executed(output: &ToolOutput) -> Self {
        Self::ToolExecuted {
            tool: output.tool.clone(),
            success: output.success,
            error_code: output.error_code,
            duration_ms: output.duration_ms,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Event name used on the SSE stream.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolExecuted { .. } => "tool_executed",
        }
    }
}

/// Fan-out hub for `ServerEvent`s.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Publish an event; returns the number of subscribers that will see it.
    pub fn publish(&self, event: ServerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let hub = EventHub::new();
        let output = ToolOutput::success("player_stop", json!("OK"), 1);
        assert_eq!(hub.publish(ServerEvent::tool_executed(&output)), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        let output = ToolOutput::success("player_stop", json!("OK"), 7);
        assert_eq!(hub.publish(ServerEvent::tool_executed(&output)), 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "tool_executed");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "tool_executed");
        assert_eq!(value["tool"], "player_stop");
        assert_eq!(value["duration_ms"], 7);
    }
}
