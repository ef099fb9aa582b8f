//! Media center library tools.
//!
//! These query or act on the media center's own database (movies, TV shows,
//! scans). Files on disk are handled by the downloads tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::backend::LibraryType;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolContext, ToolHandler, ToolParams, ToolResult};
use crate::domains::tools::schema::{NoParams, ToolDescriptor};

/// Reject blank search terms before they reach the backend.
pub(crate) fn non_blank<'a>(name: &str, value: &'a str) -> Result<&'a str, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid_value(format!("'{}' must not be blank", name)));
    }
    Ok(trimmed)
}

// ============================================================================
// search_movies
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchMoviesParams {
    /// Text contained in the movie title
    query: String,
}

/// Search the movie library by title.
pub struct SearchMoviesTool;

impl SearchMoviesTool {
    pub const NAME: &'static str = "search_movies";

    pub const DESCRIPTION: &'static str = "Search the media center's movie library by title.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<SearchMoviesParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for SearchMoviesTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: SearchMoviesParams = params.parse()?;
        let query = non_blank("query", &params.query)?;
        info!("Searching movies for '{}'", query);
        Ok(ctx.backend.search_movies(query).await?)
    }
}

// ============================================================================
// list_recent_movies
// ============================================================================

fn default_recent_limit() -> u32 {
    RecentMoviesTool::DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RecentMoviesParams {
    /// Maximum number of movies
    #[serde(default = "default_recent_limit")]
    #[schemars(range(min = 1, max = 100))]
    limit: u32,
}

/// List recently added movies.
pub struct RecentMoviesTool;

impl RecentMoviesTool {
    pub const NAME: &'static str = "list_recent_movies";

    pub const DESCRIPTION: &'static str = "List the movies most recently added to the library.";

    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<RecentMoviesParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for RecentMoviesTool {
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: RecentMoviesParams = params.parse()?;
        Ok(ctx.backend.recent_movies(params.limit).await?)
    }
}

// ============================================================================
// list_tv_shows
// ============================================================================

/// List all TV shows.
pub struct TvShowsTool;

impl TvShowsTool {
    pub const NAME: &'static str = "list_tv_shows";

    pub const DESCRIPTION: &'static str = "List all TV shows in the library.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NoParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for TvShowsTool {
    async fn call(&self, ctx: &ToolContext, _params: ToolParams) -> ToolResult {
        Ok(ctx.backend.tv_shows().await?)
    }
}

// ============================================================================
// play_movie / play_episode
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct PlayMovieParams {
    /// Library id of the movie
    movie_id: i64,
}

/// Play a library movie by id.
pub struct PlayMovieTool;

impl PlayMovieTool {
    pub const NAME: &'static str = "play_movie";

    pub const DESCRIPTION: &'static str = "Play a movie from the library by its id.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<PlayMovieParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for PlayMovieTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: PlayMovieParams = params.parse()?;
        info!("Playing movie {}", params.movie_id);
        Ok(ctx.backend.play_movie(params.movie_id).await?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PlayEpisodeParams {
    /// Library id of the TV show
    tvshow_id: i64,

    /// Season number
    season: i64,

    /// Episode number
    episode: i64,
}

/// Play one episode of a TV show.
pub struct PlayEpisodeTool;

impl PlayEpisodeTool {
    pub const NAME: &'static str = "play_episode";

    pub const DESCRIPTION: &'static str =
        "Play a TV show episode identified by show id, season and episode number.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<PlayEpisodeParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for PlayEpisodeTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: PlayEpisodeParams = params.parse()?;
        info!(
            "Playing show {} S{:02}E{:02}",
            params.tvshow_id, params.season, params.episode
        );
        Ok(ctx
            .backend
            .play_episode(params.tvshow_id, params.season, params.episode)
            .await?)
    }
}

// ============================================================================
// get_library_stats / scan_library
// ============================================================================

/// Item counts per library section.
pub struct LibraryStatsTool;

impl LibraryStatsTool {
    pub const NAME: &'static str = "get_library_stats";

    pub const DESCRIPTION: &'static str =
        "Get library totals: movies, TV shows, episodes and songs.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<NoParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for LibraryStatsTool {
    async fn call(&self, ctx: &ToolContext, _params: ToolParams) -> ToolResult {
        Ok(ctx.backend.library_stats().await?)
    }
}

fn default_library_type() -> String {
    LibraryType::default().as_str().to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScanLibraryParams {
    /// Library section to scan
    #[serde(default = "default_library_type")]
    #[schemars(extend("enum" = ["video", "audio"]))]
    library_type: String,
}

/// Ask the media center to rescan its sources.
pub struct ScanLibraryTool;

impl ScanLibraryTool {
    pub const NAME: &'static str = "scan_library";

    pub const DESCRIPTION: &'static str =
        "Start a library scan so newly added files appear in the media center.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<ScanLibraryParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for ScanLibraryTool {
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: ScanLibraryParams = params.parse()?;
        let library: LibraryType = params
            .library_type
            .parse()
            .map_err(ToolError::invalid_value)?;
        Ok(ctx.backend.scan_library(library).await?)
    }
}
