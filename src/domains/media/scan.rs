//! Directory scanning for video files.
//!
//! A scan walks the whole tree under a root directory and yields every
//! regular, non-hidden file with a recognized video extension. Subdirectories
//! that cannot be read are logged and skipped; only an unreadable root fails
//! the scan.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::error::MediaError;

/// Video extensions recognized by the scanner (compared case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// A video file found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Absolute path of the file.
    pub path: PathBuf,

    /// File name including extension.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

impl MediaFile {
    /// Read the entry for `path` from the filesystem.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    /// JSON representation used in tool payloads.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "path": self.path.to_string_lossy(),
            "size": self.size,
            "size_formatted": format_size(self.size),
            "modified": self.modified.map(|m| m.to_rfc3339()),
            "type": "video",
        })
    }
}

/// Check whether a path carries a recognized video extension.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Recursively collect every video file under `root`.
///
/// Symbolic links are not followed. The result is sorted by path so two scans
/// of an unchanged tree return the same sequence.
pub fn scan_videos(root: &Path) -> Result<Vec<MediaFile>, MediaError> {
    let root_entries =
        fs::read_dir(root).map_err(|e| MediaError::directory_unavailable(root, e))?;

    let mut files = Vec::new();
    let mut pending = Vec::new();
    collect_entries(root_entries, &mut files, &mut pending);

    while let Some(dir) = pending.pop() {
        match fs::read_dir(&dir) {
            Ok(entries) => collect_entries(entries, &mut files, &mut pending),
            Err(e) => warn!("Skipping unreadable directory {}: {}", dir.display(), e),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Scanned {} video files under {}", files.len(), root.display());
    Ok(files)
}

fn collect_entries(entries: fs::ReadDir, files: &mut Vec<MediaFile>, pending: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading entry: {}", e);
                continue;
            }
        };

        let name = entry.file_name();
        if is_hidden(&name.to_string_lossy()) {
            continue;
        }

        // file_type() does not follow symlinks, so links are neither files nor dirs here
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to get file type for {:?}: {}", name, e);
                continue;
            }
        };

        let path = entry.path();
        if file_type.is_dir() {
            pending.push(path);
        } else if file_type.is_file() && is_video_file(&path) {
            match MediaFile::from_path(&path) {
                Ok(file) => files.push(file),
                Err(e) => warn!("Failed to get metadata for {}: {}", path.display(), e),
            }
        }
    }
}

/// Format file size in human-readable format.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_scan_filters_to_videos_recursively() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "Movie.One.mkv");
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "Season 1/Show.S01E01.MP4");
        touch(temp_dir.path(), "Season 1/deeper/Clip.webm");

        let files = scan_videos(temp_dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(files.len(), 3);
        assert!(names.contains(&"Movie.One.mkv"));
        assert!(names.contains(&"Show.S01E01.MP4"));
        assert!(names.contains(&"Clip.webm"));
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), ".hidden.mkv");
        touch(temp_dir.path(), ".cache/Inside.mkv");
        touch(temp_dir.path(), "Visible.mkv");

        let files = scan_videos(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Visible.mkv");
    }

    #[test]
    fn test_scan_missing_root_is_unavailable() {
        let result = scan_videos(Path::new("/nonexistent/path/12345"));
        assert!(matches!(
            result,
            Err(MediaError::DirectoryUnavailable { .. })
        ));
    }

    #[test]
    fn test_scan_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(scan_videos(temp_dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_continues_past_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "locked/Hidden.Away.mkv");
        touch(temp_dir.path(), "open/Reachable.mkv");

        let locked = temp_dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let files = scan_videos(temp_dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(files.iter().any(|f| f.name == "Reachable.mkv"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_ignores_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "Real.mkv");
        symlink(temp_dir.path().join("Real.mkv"), temp_dir.path().join("Link.mkv")).unwrap();

        let files = scan_videos(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Real.mkv");
    }

    #[test]
    fn test_is_video_file_case_insensitive() {
        assert!(is_video_file(Path::new("a/b/Movie.MKV")));
        assert!(is_video_file(Path::new("clip.m4v")));
        assert!(!is_video_file(Path::new("subs.srt")));
        assert!(!is_video_file(Path::new("mkv")));
    }

    #[test]
    fn test_stem_strips_extension() {
        let file = MediaFile {
            path: PathBuf::from("/x/Avengers.Endgame.mkv"),
            name: "Avengers.Endgame.mkv".to_string(),
            size: 0,
            modified: None,
        };
        assert_eq!(file.stem(), "Avengers.Endgame");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }
}
