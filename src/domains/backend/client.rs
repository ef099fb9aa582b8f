//! Media center control client.
//!
//! `MediaCenter` is the contract the tools call into; `KodiClient` implements
//! it over Kodi's JSON-RPC HTTP endpoint. Every operation is a discrete
//! request/response exchange and every fault comes back as a `BackendError`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use super::error::BackendError;
use super::types::{LibraryType, NavigationDirection};
use crate::core::config::BackendConfig;

/// Longest pause between two retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Remote operations offered by the media center.
#[async_trait]
pub trait MediaCenter: Send + Sync {
    /// Check that the media center answers.
    async fn ping(&self) -> Result<bool, BackendError>;

    /// Describe what is currently playing.
    async fn playback_state(&self) -> Result<Value, BackendError>;

    /// Toggle play/pause on the active player.
    async fn play_pause(&self) -> Result<Value, BackendError>;

    /// Stop the active player.
    async fn stop(&self) -> Result<Value, BackendError>;

    /// Set the output volume (0-100).
    async fn set_volume(&self, level: u8) -> Result<Value, BackendError>;

    /// Send a menu navigation key.
    async fn navigate(&self, direction: NavigationDirection) -> Result<Value, BackendError>;

    /// Movies whose title contains `query`.
    async fn search_movies(&self, query: &str) -> Result<Value, BackendError>;

    /// Most recently added movies.
    async fn recent_movies(&self, limit: u32) -> Result<Value, BackendError>;

    /// All TV shows.
    async fn tv_shows(&self) -> Result<Value, BackendError>;

    /// Play a library movie.
    async fn play_movie(&self, movie_id: i64) -> Result<Value, BackendError>;

    /// Play one episode of a TV show.
    async fn play_episode(
        &self,
        tvshow_id: i64,
        season: i64,
        episode: i64,
    ) -> Result<Value, BackendError>;

    /// Item counts per library section.
    async fn library_stats(&self) -> Result<Value, BackendError>;

    /// Start a library rescan.
    async fn scan_library(&self, library: LibraryType) -> Result<Value, BackendError>;

    /// Play a file by its path as seen by the media center.
    async fn play_file(&self, path: &str) -> Result<Value, BackendError>;
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcReplyError>,
}

#[derive(Debug, Deserialize)]
struct RpcReplyError {
    code: i64,
    message: String,
}

/// JSON-RPC client for a Kodi instance.
pub struct KodiClient {
    http: reqwest::Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    retry_attempts: u32,
    retry_delay: Duration,
    next_id: AtomicU64,
}

impl KodiClient {
    /// Create a client for the configured Kodi instance.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            next_id: AtomicU64::new(1),
        })
    }

    /// Call a JSON-RPC method, retrying transient failures with exponential backoff.
    #[instrument(skip(self, params))]
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, BackendError> {
        let mut attempt = 1;
        loop {
            match self.call_once(method, params.as_ref()).await {
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}",
                        method, attempt, self.retry_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    async fn call_once(&self, method: &str, params: Option<&Value>) -> Result<Value, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "id": id,
        });
        if let Some(params) = params {
            payload["params"] = params.clone();
        }

        debug!("Kodi request: {} {:?}", method, params);

        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::unavailable(format!("Timeout calling {}", method))
            } else {
                BackendError::unavailable(format!("Cannot reach media center: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::unavailable(format!("HTTP {}: {}", status, body)));
        }

        let reply: RpcReply = response
            .json()
            .await
            .map_err(|e| BackendError::invalid_response(e.to_string()))?;

        if let Some(error) = reply.error {
            warn!("Kodi error for {}: {} ({})", method, error.message, error.code);
            return Err(BackendError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }

    /// First active player as `(id, type)`.
    async fn active_player(&self) -> Result<Option<(i64, String)>, BackendError> {
        let players = self.call("Player.GetActivePlayers", None).await?;
        Ok(players
            .as_array()
            .and_then(|list| list.first())
            .and_then(|player| {
                let id = player.get("playerid")?.as_i64()?;
                let kind = player
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                Some((id, kind))
            }))
    }

    async fn require_player(&self) -> Result<i64, BackendError> {
        self.active_player()
            .await?
            .map(|(id, _)| id)
            .ok_or(BackendError::NoActivePlayer)
    }

    /// Item total reported by a library listing method.
    async fn count(&self, method: &str) -> Result<u64, BackendError> {
        let result = self
            .call(method, Some(json!({ "limits": { "end": 0 } })))
            .await?;
        Ok(result
            .pointer("/limits/total")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Call with `properties`, falling back to `fallback` when Kodi rejects them.
    async fn call_with_fallback(
        &self,
        method: &str,
        params: Value,
        fallback: Value,
    ) -> Result<Value, BackendError> {
        match self.call(method, Some(params)).await {
            Err(BackendError::Rpc { message, .. }) => {
                warn!("{} rejected ({}), retrying with fewer properties", method, message);
                self.call(method, Some(fallback)).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl MediaCenter for KodiClient {
    async fn ping(&self) -> Result<bool, BackendError> {
        let result = self.call("JSONRPC.Ping", None).await?;
        Ok(result.as_str() == Some("pong"))
    }

    async fn playback_state(&self) -> Result<Value, BackendError> {
        let Some((player_id, player_type)) = self.active_player().await? else {
            return Ok(json!({ "status": "nothing_playing" }));
        };

        let mut state = json!({
            "status": "playing",
            "player_id": player_id,
            "player_type": player_type,
        });

        match self
            .call_with_fallback(
                "Player.GetItem",
                json!({
                    "playerid": player_id,
                    "properties": ["title", "duration", "file", "thumbnail"],
                }),
                json!({ "playerid": player_id }),
            )
            .await
        {
            Ok(item) => state["item"] = item.get("item").cloned().unwrap_or_default(),
            Err(e) => warn!("Player.GetItem failed: {}", e),
        }

        match self
            .call_with_fallback(
                "Player.GetProperties",
                json!({
                    "playerid": player_id,
                    "properties": ["time", "totaltime", "percentage", "speed"],
                }),
                json!({
                    "playerid": player_id,
                    "properties": ["time", "totaltime"],
                }),
            )
            .await
        {
            Ok(properties) => state["properties"] = properties,
            Err(e) => warn!("Player.GetProperties failed: {}", e),
        }

        Ok(state)
    }

    async fn play_pause(&self) -> Result<Value, BackendError> {
        let player_id = self.require_player().await?;
        self.call("Player.PlayPause", Some(json!({ "playerid": player_id })))
            .await
    }

    async fn stop(&self) -> Result<Value, BackendError> {
        let player_id = self.require_player().await?;
        self.call("Player.Stop", Some(json!({ "playerid": player_id })))
            .await
    }

    async fn set_volume(&self, level: u8) -> Result<Value, BackendError> {
        self.call("Application.SetVolume", Some(json!({ "volume": level })))
            .await
    }

    async fn navigate(&self, direction: NavigationDirection) -> Result<Value, BackendError> {
        self.call(direction.rpc_method(), None).await
    }

    async fn search_movies(&self, query: &str) -> Result<Value, BackendError> {
        self.call(
            "VideoLibrary.GetMovies",
            Some(json!({
                "filter": { "operator": "contains", "field": "title", "value": query },
                "properties": [
                    "title", "year", "rating", "runtime", "plot", "director",
                    "genre", "thumbnail", "fanart", "file"
                ],
                "sort": { "order": "ascending", "method": "title" },
            })),
        )
        .await
    }

    async fn recent_movies(&self, limit: u32) -> Result<Value, BackendError> {
        self.call(
            "VideoLibrary.GetRecentlyAddedMovies",
            Some(json!({
                "properties": [
                    "title", "year", "rating", "runtime", "plot", "director",
                    "genre", "thumbnail", "fanart", "dateadded", "file"
                ],
                "limits": { "end": limit },
            })),
        )
        .await
    }

    async fn tv_shows(&self) -> Result<Value, BackendError> {
        self.call(
            "VideoLibrary.GetTVShows",
            Some(json!({
                "properties": [
                    "title", "year", "rating", "plot", "genre", "thumbnail",
                    "fanart", "premiered", "studio", "mpaa", "file"
                ],
                "sort": { "order": "ascending", "method": "title" },
            })),
        )
        .await
    }

    async fn play_movie(&self, movie_id: i64) -> Result<Value, BackendError> {
        self.call("Player.Open", Some(json!({ "item": { "movieid": movie_id } })))
            .await
    }

    async fn play_episode(
        &self,
        tvshow_id: i64,
        season: i64,
        episode: i64,
    ) -> Result<Value, BackendError> {
        let listing = self
            .call(
                "VideoLibrary.GetEpisodes",
                Some(json!({
                    "tvshowid": tvshow_id,
                    "season": season,
                    "properties": ["episode"],
                })),
            )
            .await?;

        let episode_id = listing
            .get("episodes")
            .and_then(Value::as_array)
            .and_then(|episodes| {
                episodes
                    .iter()
                    .find(|ep| ep.get("episode").and_then(Value::as_i64) == Some(episode))
            })
            .and_then(|ep| ep.get("episodeid").and_then(Value::as_i64))
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "Episode {}x{:02} of show {}",
                    season, episode, tvshow_id
                ))
            })?;

        self.call("Player.Open", Some(json!({ "item": { "episodeid": episode_id } })))
            .await
    }

    async fn library_stats(&self) -> Result<Value, BackendError> {
        let movies = self.count("VideoLibrary.GetMovies").await?;
        let tv_shows = self.count("VideoLibrary.GetTVShows").await?;
        let episodes = self.count("VideoLibrary.GetEpisodes").await?;
        let songs = self.count("AudioLibrary.GetSongs").await?;

        Ok(json!({
            "movies": movies,
            "tv_shows": tv_shows,
            "episodes": episodes,
            "songs": songs,
            "total_video_items": movies + episodes,
        }))
    }

    async fn scan_library(&self, library: LibraryType) -> Result<Value, BackendError> {
        self.call(library.scan_method(), None).await
    }

    async fn play_file(&self, path: &str) -> Result<Value, BackendError> {
        self.call("Player.Open", Some(json!({ "item": { "file": path } })))
            .await
    }
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use super::*;
    use axum::{Json, Router, routing::post};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Start a fake Kodi answering a few methods; returns its port and the methods seen.
    async fn fake_kodi() -> (u16, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        let app = Router::new().route(
            "/jsonrpc",
            post(move |Json(request): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let method = request["method"].as_str().unwrap_or_default().to_string();
                    recorder.lock().unwrap().push(method.clone());
                    let id = request["id"].clone();
                    let reply = match method.as_str() {
                        "JSONRPC.Ping" => json!({ "jsonrpc": "2.0", "id": id, "result": "pong" }),
                        "Player.GetActivePlayers" => {
                            json!({ "jsonrpc": "2.0", "id": id, "result": [] })
                        }
                        "VideoLibrary.GetEpisodes" => json!({
                            "jsonrpc": "2.0", "id": id,
                            "result": { "episodes": [
                                { "episode": 1, "episodeid": 101 },
                                { "episode": 2, "episodeid": 102 }
                            ], "limits": { "total": 2 } }
                        }),
                        "Player.Open" => json!({ "jsonrpc": "2.0", "id": id, "result": "OK" }),
                        _ => json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": { "code": -32601, "message": "Method not found." }
                        }),
                    };
                    Json(reply)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (port, seen)
    }

    fn config_for(port: u16) -> BackendConfig {
        BackendConfig {
            host: "127.0.0.1".to_string(),
            port,
            retry_attempts: 2,
            retry_delay_ms: 1,
            ..BackendConfig::default()
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (port, _) = fake_kodi().await;
        let client = KodiClient::new(&config_for(port)).unwrap();
        assert!(client.ping().await.unwrap());
    }

    #[tokio::test]
    async fn test_nothing_playing() {
        let (port, _) = fake_kodi().await;
        let client = KodiClient::new(&config_for(port)).unwrap();
        let state = client.playback_state().await.unwrap();
        assert_eq!(state["status"], "nothing_playing");
    }

    #[tokio::test]
    async fn test_play_pause_without_player() {
        let (port, seen) = fake_kodi().await;
        let client = KodiClient::new(&config_for(port)).unwrap();
        let result = client.play_pause().await;
        assert!(matches!(result, Err(BackendError::NoActivePlayer)));
        assert!(!seen.lock().unwrap().contains(&"Player.PlayPause".to_string()));
    }

    #[tokio::test]
    async fn test_play_episode_resolves_episode_id() {
        let (port, seen) = fake_kodi().await;
        let client = KodiClient::new(&config_for(port)).unwrap();
        client.play_episode(7, 1, 2).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["VideoLibrary.GetEpisodes".to_string(), "Player.Open".to_string()]
        );

        let missing = client.play_episode(7, 1, 9).await;
        assert!(matches!(missing, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rpc_error_is_not_retried() {
        let (port, seen) = fake_kodi().await;
        let client = KodiClient::new(&config_for(port)).unwrap();
        let result = client.call("Unknown.Method", None).await;
        assert!(matches!(result, Err(BackendError::Rpc { code: -32601, .. })));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = KodiClient::new(&config_for(port)).unwrap();
        let result = client.ping().await;
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let client = KodiClient::new(&BackendConfig {
            retry_delay_ms: 1000,
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(client.backoff(1), Duration::from_secs(1));
        assert_eq!(client.backoff(2), Duration::from_secs(2));
        assert_eq!(client.backoff(3), Duration::from_secs(4));
        assert_eq!(client.backoff(10), MAX_RETRY_DELAY);
    }
}
