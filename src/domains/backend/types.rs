//! Value types shared between tools and the media center client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Directions accepted by the menu navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
}

impl NavigationDirection {
    /// All directions, in the order they are advertised.
    pub const ALL: [Self; 6] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Select,
        Self::Back,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Select => "select",
            Self::Back => "back",
        }
    }

    /// The media center's input method for this direction.
    pub fn rpc_method(self) -> &'static str {
        match self {
            Self::Up => "Input.Up",
            Self::Down => "Input.Down",
            Self::Left => "Input.Left",
            Self::Right => "Input.Right",
            Self::Select => "Input.Select",
            Self::Back => "Input.Back",
        }
    }
}

impl fmt::Display for NavigationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavigationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid direction: {}", s))
    }
}

/// Library sections that can be rescanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    #[default]
    Video,
    Audio,
}

impl LibraryType {
    pub const ALL: [Self; 2] = [Self::Video, Self::Audio];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// The media center's scan method for this section.
    pub fn scan_method(self) -> &'static str {
        match self {
            Self::Video => "VideoLibrary.Scan",
            Self::Audio => "AudioLibrary.Scan",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid library type: {}", s))
    }
}
