//! Tool definitions module.
//!
//! Each tool is a unit struct carrying its `NAME`, `DESCRIPTION` and
//! `descriptor()`, plus a `ToolHandler` implementation. Tools are grouped by
//! the area they act on.

pub mod downloads;
pub mod library;
pub mod playback;

pub use downloads::{FindAndPlayTool, ListDownloadsTool, PlayFileTool, SearchDownloadsTool};
pub use library::{
    LibraryStatsTool, PlayEpisodeTool, PlayMovieTool, RecentMoviesTool, ScanLibraryTool,
    SearchMoviesTool, TvShowsTool,
};
pub use playback::{NavigateMenuTool, NowPlayingTool, PlayPauseTool, SetVolumeTool, StopTool};
