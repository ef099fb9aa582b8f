//! Downloads directory tools.
//!
//! Listing, substring search and best-match playback over the video files in
//! the configured downloads directory. Directory scans run on the blocking
//! thread pool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::library::non_blank;
use crate::domains::media::{MediaError, MediaFile, MediaLibrary, Query};
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolContext, ToolHandler, ToolParams, ToolResult};
use crate::domains::tools::schema::ToolDescriptor;

/// Number of ranked matches echoed back by `find_and_play`.
const TOP_MATCHES: usize = 5;

/// Run a library operation on the blocking pool.
async fn on_library<T, F>(library: &MediaLibrary, op: F) -> Result<T, ToolError>
where
    F: FnOnce(&MediaLibrary) -> Result<T, MediaError> + Send + 'static,
    T: Send + 'static,
{
    let library = library.clone();
    tokio::task::spawn_blocking(move || op(&library))
        .await
        .map_err(|e| ToolError::internal(format!("Directory scan aborted: {}", e)))?
        .map_err(ToolError::from)
}

fn files_json(files: &[MediaFile]) -> Vec<Value> {
    files.iter().map(MediaFile::to_json).collect()
}

// ============================================================================
// list_downloads
// ============================================================================

fn default_list_limit() -> usize {
    ListDownloadsTool::DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListDownloadsParams {
    /// Maximum number of files
    #[serde(default = "default_list_limit")]
    #[schemars(range(min = 1, max = 1000))]
    limit: usize,
}

/// List video files in the downloads directory.
pub struct ListDownloadsTool;

impl ListDownloadsTool {
    pub const NAME: &'static str = "list_downloads";

    pub const DESCRIPTION: &'static str =
        "List video files in the downloads directory (recursive), most recent first.";

    pub const DEFAULT_LIMIT: usize = 50;

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<ListDownloadsParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for ListDownloadsTool {
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: ListDownloadsParams = params.parse()?;
        let limit = params.limit;
        let files = on_library(&ctx.library, move |lib| lib.list(Some(limit))).await?;

        Ok(json!({
            "path": ctx.library.root().to_string_lossy(),
            "total": files.len(),
            "files": files_json(&files),
        }))
    }
}

// ============================================================================
// play_file
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct PlayFileParams {
    /// Full path of the file to play
    file_path: String,
}

/// Play a file by path.
pub struct PlayFileTool;

impl PlayFileTool {
    pub const NAME: &'static str = "play_file";

    pub const DESCRIPTION: &'static str =
        "Play a file by its full path as seen by the media center.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<PlayFileParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for PlayFileTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: PlayFileParams = params.parse()?;
        let file_path = non_blank("file_path", &params.file_path)?;
        info!("Playing file {}", file_path);

        let result = ctx.backend.play_file(file_path).await?;
        let name = file_path.rsplit('/').next().unwrap_or(file_path);
        Ok(json!({
            "file_path": file_path,
            "message": format!("Playback started: {}", name),
            "result": result,
        }))
    }
}

// ============================================================================
// search_downloads
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchDownloadsParams {
    /// Text contained in the file name
    query: String,
}

/// Case-insensitive substring search over downloaded file names.
pub struct SearchDownloadsTool;

impl SearchDownloadsTool {
    pub const NAME: &'static str = "search_downloads";

    pub const DESCRIPTION: &'static str =
        "Search video files in the downloads directory by name (case-insensitive).";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<SearchDownloadsParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for SearchDownloadsTool {
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: SearchDownloadsParams = params.parse()?;
        let query = non_blank("query", &params.query)?.to_string();
        let needle = query.clone();
        let files = on_library(&ctx.library, move |lib| lib.search(&needle)).await?;

        Ok(json!({
            "query": query,
            "path": ctx.library.root().to_string_lossy(),
            "total": files.len(),
            "files": files_json(&files),
        }))
    }
}

// ============================================================================
// find_and_play
// ============================================================================

fn default_auto_play() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FindAndPlayParams {
    /// Title or words to look for
    query: String,

    /// Play the best match
    #[serde(default = "default_auto_play")]
    auto_play: bool,
}

/// Rank downloaded files against a query and optionally play the winner.
pub struct FindAndPlayTool;

impl FindAndPlayTool {
    pub const NAME: &'static str = "find_and_play";

    pub const DESCRIPTION: &'static str = "Find the downloaded file that best matches a free-text \
        query and start playing it. Set auto_play to false to only see the ranking.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::for_params::<FindAndPlayParams>(Self::NAME, Self::DESCRIPTION)
    }
}

#[async_trait]
impl ToolHandler for FindAndPlayTool {
    #[instrument(skip_all)]
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult {
        let params: FindAndPlayParams = params.parse()?;
        let query = Query::parse(&params.query)?;

        let ranked = {
            let query = query.clone();
            on_library(&ctx.library, move |lib| lib.find(&query)).await?
        };

        // find() never succeeds with an empty ranking
        let Some(best) = ranked.first() else {
            return Err(ToolError::NoMatchFound(format!(
                "No file matches '{}'",
                query.text()
            )));
        };
        let best_path = best.file.path.to_string_lossy().into_owned();

        let mut payload = json!({
            "query": query.text(),
            "total_found": ranked.len(),
            "best_match": best.to_json(),
            "all_matches": ranked.iter().take(TOP_MATCHES).map(|c| c.to_json()).collect::<Vec<_>>(),
            "path": ctx.library.root().to_string_lossy(),
            "auto_played": false,
        });

        if params.auto_play {
            info!("Auto-playing best match {}", best_path);
            ctx.backend.play_file(&best_path).await?;
            payload["auto_played"] = json!(true);
            payload["message"] = json!(format!("Playback started: {}", best.file.name));
        }

        Ok(payload)
    }
}
