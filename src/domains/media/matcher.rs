//! Ranking of scanned files and the `MediaLibrary` facade.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::error::MediaError;
use super::scan::{MediaFile, scan_videos};
use super::scoring::{MatchScore, Query, round_score, score_name};

/// A scanned file with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub file: MediaFile,
    pub score: MatchScore,
}

impl Candidate {
    /// JSON representation: the file entry plus `relevance_score` and `signals`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = self.file.to_json();
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "relevance_score".to_string(),
                serde_json::json!(round_score(self.score.total())),
            );
            object.insert("signals".to_string(), self.score.to_json());
        }
        value
    }
}

/// Winner-first ordering: higher score, then shorter path, then path order.
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total()
        .total_cmp(&a.score.total())
        .then_with(|| {
            a.file
                .path
                .as_os_str()
                .len()
                .cmp(&b.file.path.as_os_str().len())
        })
        .then_with(|| a.file.path.cmp(&b.file.path))
}

/// Score and order files against a query.
///
/// Files without any matching query word are dropped. The first element, if
/// any, is the single winner.
pub fn rank(files: Vec<MediaFile>, query: &Query) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = files
        .into_iter()
        .filter_map(|file| {
            score_name(file.stem(), query).map(|score| Candidate { file, score })
        })
        .collect();

    candidates.sort_by(compare_candidates);
    candidates
}

/// Most recently modified first; files without a timestamp last, then by path.
fn compare_recency(a: &MediaFile, b: &MediaFile) -> Ordering {
    b.modified
        .cmp(&a.modified)
        .then_with(|| a.path.cmp(&b.path))
}

/// Video files under one configured root directory.
///
/// Every call rescans the tree; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    /// Create a library rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory scanned by this library.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All video files, newest first, optionally capped at `limit` entries.
    #[instrument(skip(self))]
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<MediaFile>, MediaError> {
        let mut files = scan_videos(&self.root)?;
        files.sort_by(compare_recency);
        if let Some(limit) = limit {
            files.truncate(limit);
        }
        debug!("Listing {} files", files.len());
        Ok(files)
    }

    /// Files whose name contains `needle`, case-insensitively, in path order.
    #[instrument(skip(self))]
    pub fn search(&self, needle: &str) -> Result<Vec<MediaFile>, MediaError> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Err(MediaError::EmptyQuery);
        }

        let files: Vec<MediaFile> = scan_videos(&self.root)?
            .into_iter()
            .filter(|file| file.name.to_lowercase().contains(&needle))
            .collect();

        info!("Search '{}' matched {} files", needle, files.len());
        Ok(files)
    }

    /// Ranked candidates for `query`; never empty on success.
    #[instrument(skip(self, query), fields(query = %query.text()))]
    pub fn find(&self, query: &Query) -> Result<Vec<Candidate>, MediaError> {
        let files = scan_videos(&self.root)?;
        let scanned = files.len();
        let candidates = rank(files, query);

        if candidates.is_empty() {
            info!("No match among {} files", scanned);
            return Err(MediaError::NoMatchFound {
                query: query.text().to_string(),
                root: self.root.clone(),
            });
        }

        info!(
            "{} of {} files matched, best: {}",
            candidates.len(),
            scanned,
            candidates[0].file.name
        );
        Ok(candidates)
    }
}
