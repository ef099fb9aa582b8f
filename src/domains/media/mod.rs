//! Media matching domain.
//!
//! Answers "which file under the downloads root best matches this text".
//! Every operation runs Scan → Filter → Score → Rank → Select within a single
//! call:
//!
//! - `scan.rs` - recursive directory walk filtered to video extensions
//! - `scoring.rs` - the named relevance signals
//! - `matcher.rs` - ranking, tie-breaking and the `MediaLibrary` facade
//! - `error.rs` - matching error types

mod error;
pub mod matcher;
pub mod scan;
pub mod scoring;

pub use error::MediaError;
pub use matcher::{Candidate, MediaLibrary, rank};
pub use scan::{MediaFile, VIDEO_EXTENSIONS, format_size, is_video_file, scan_videos};
pub use scoring::{MatchScore, Query, score_name};
