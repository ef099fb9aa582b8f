//! Playback control tools.
//!
//! Thin pass-throughs to the media center's player and input APIs.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::backend::NavigationDirection;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolContext, ToolHandler, ToolParams, ToolResult};
use crate::domains::tools::schema::{NoParams, ToolDescriptor};

// ============================================================================
// get_now_playing
// ============================================================================

/// Report what the media center is currently playing.
pub struct NowPlayingTool;

impl NowPlayingTool {
    pub const NAME: &'static str = "get_now_playing";

    pub const DESCRIPTION: &'static str =
        "Get the item currently playing on the media center, with playback position.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NoParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for NowPlayingTool {
    async fn call(&self, ctx: &ToolContext, _params: ToolParams) -> ToolResult {
        Ok(ctx.backend.playback_state().await?)
    }
}

// ============================================================================
// player_play_pause / player_stop
// ============================================================================

/// Toggle play/pause on the active player.
pub struct PlayPauseTool;

impl PlayPauseTool {
    pub const NAME: &'static str = "player_play_pause";

    pub const DESCRIPTION: &'static str = "Toggle play/pause on the active player.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NoParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for PlayPauseTool {
    async fn call(&self, ctx: &ToolContext, _params: ToolParams) -> ToolResult {
        Ok(ctx.backend.play_pause().await?)
    }
}

/// Stop the active player.
pub struct StopTool;

impl StopTool {
    pub const NAME: &'static str = "player_stop";

    pub const DESCRIPTION: &'static str = "Stop playback on the active player.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NoParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for StopTool {
    async fn call(&self, ctx: &ToolContext, _params: ToolParams) -> ToolResult {
        Ok(ctx.backend.stop().await?)
    }
}

// ============================================================================
// set_volume
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct SetVolumeParams {
    /// Volume level from 0 to 100
    #[schemars(range(min = 0, max = 100))]
    level: u8,
}

/// Set the output volume.
pub struct SetVolumeTool;

impl SetVolumeTool {
    pub const NAME: &'static str = "set_volume";

    pub const DESCRIPTION: &'static str = "Set the media center volume (0-100).";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<SetVolumeParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for SetVolumeTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: SetVolumeParams = params.parse()?;
        info!("Setting volume to {}", params.level);
        Ok(ctx.backend.set_volume(params.level).await?)
    }
}

// ============================================================================
// navigate_menu
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct NavigateParams {
    /// Navigation key to send
    #[schemars(extend("enum" = ["up", "down", "left", "right", "select", "back"]))]
    direction: String,
}

/// Send a navigation key to the media center UI.
pub struct NavigateMenuTool;

impl NavigateMenuTool {
    pub const NAME: &'static str = "navigate_menu";

    pub const DESCRIPTION: &'static str =
        "Navigate the media center menus: up, down, left, right, select or back.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NavigateParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for NavigateMenuTool {
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: NavigateParams = params.parse()?;
        let direction: NavigationDirection =
            params.direction.parse().map_err(ToolError::invalid_value)?;
        Ok(ctx.backend.navigate(direction).await?)
    }
}
