//! Relevance scoring of file names against a free-text query.
//!
//! A score is the sum of four independent signals:
//!
//! - **word match**: each query word found as a whole token earns
//!   [`EXACT_WORD_WEIGHT`], a word found only inside a longer token earns
//!   [`PARTIAL_WORD_WEIGHT`]
//! - **position**: each matched word adds [`POSITION_WEIGHT`] divided by one
//!   plus its character offset, so earlier matches weigh more
//! - **quality**: a flat [`QUALITY_BONUS`] when the name carries a
//!   release-quality marker such as `1080p` or `bluray`
//! - **suspicion**: a flat [`SUSPICION_PENALTY`] when the name looks like
//!   non-primary content such as a sample or trailer
//!
//! A name in which no query word occurs has no score at all and is never a
//! candidate.

use super::error::MediaError;

/// Weight of a query word that equals a whole token of the name.
pub const EXACT_WORD_WEIGHT: f64 = 15.0;

/// Weight of a query word that only occurs inside a longer token.
pub const PARTIAL_WORD_WEIGHT: f64 = 5.0;

/// Position bonus of a match starting at offset zero.
pub const POSITION_WEIGHT: f64 = 20.0;

/// Bonus for names carrying a quality marker.
pub const QUALITY_BONUS: f64 = 5.0;

/// Penalty for names carrying a suspicion marker.
pub const SUSPICION_PENALTY: f64 = 10.0;

/// Tokens that indicate a high-quality release.
pub const QUALITY_MARKERS: &[&str] = &[
    "2160p", "1080p", "720p", "4k", "uhd", "hdr", "bluray", "bdrip", "remux", "webrip",
];

/// Tokens that indicate samples, trailers and other non-primary content.
pub const SUSPICION_MARKERS: &[&str] = &[
    "sample", "trailer", "preview", "demo", "extras", "featurette",
];

/// A lowercase word of a name together with its character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub offset: usize,
    pub text: String,
}

/// Split text into lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (index, ch) in text.chars().enumerate() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = index;
            }
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(Token {
                offset: start,
                text: std::mem::take(&mut current),
            });
        }
    }

    if !current.is_empty() {
        tokens.push(Token {
            offset: start,
            text: current,
        });
    }

    tokens
}

/// A parsed search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    words: Vec<String>,
}

impl Query {
    /// Parse free text into distinct lowercase words.
    pub fn parse(text: &str) -> Result<Self, MediaError> {
        let mut words: Vec<String> = Vec::new();
        for token in tokenize(text) {
            if !words.contains(&token.text) {
                words.push(token.text);
            }
        }

        if words.is_empty() {
            return Err(MediaError::EmptyQuery);
        }

        Ok(Self {
            text: text.trim().to_string(),
            words,
        })
    }

    /// The query as the caller typed it (trimmed).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The distinct lowercase words of the query.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Where a query word was found in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordHit {
    /// True when the word equals a whole token.
    pub exact: bool,

    /// Character offset of the match within the name.
    pub offset: usize,
}

/// Locate a query word among the tokens of a name.
///
/// Whole-token matches take precedence over substring matches, and the first
/// occurrence of each kind wins.
pub fn locate_word(word: &str, tokens: &[Token]) -> Option<WordHit> {
    if let Some(token) = tokens.iter().find(|t| t.text == word) {
        return Some(WordHit {
            exact: true,
            offset: token.offset,
        });
    }

    tokens.iter().find_map(|token| {
        token.text.find(word).map(|byte_index| WordHit {
            exact: false,
            offset: token.offset + token.text[..byte_index].chars().count(),
        })
    })
}

/// Word-match signal.
pub fn word_match_score(hits: &[WordHit]) -> f64 {
    hits.iter()
        .map(|hit| {
            if hit.exact {
                EXACT_WORD_WEIGHT
            } else {
                PARTIAL_WORD_WEIGHT
            }
        })
        .sum()
}

/// Position signal.
pub fn position_score(hits: &[WordHit]) -> f64 {
    hits.iter()
        .map(|hit| POSITION_WEIGHT / (1.0 + hit.offset as f64))
        .sum()
}

/// Quality signal.
pub fn quality_score(tokens: &[Token]) -> f64 {
    if has_marker(tokens, QUALITY_MARKERS) {
        QUALITY_BONUS
    } else {
        0.0
    }
}

/// Suspicion signal (zero or negative).
pub fn suspicion_score(tokens: &[Token]) -> f64 {
    if has_marker(tokens, SUSPICION_MARKERS) {
        -SUSPICION_PENALTY
    } else {
        0.0
    }
}

fn has_marker(tokens: &[Token], markers: &[&str]) -> bool {
    tokens
        .iter()
        .any(|token| markers.contains(&token.text.as_str()))
}

/// Per-signal breakdown of a name's relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub word_match: f64,
    pub position: f64,
    pub quality: f64,
    pub suspicion: f64,

    /// Number of distinct query words found in the name.
    pub matched_words: usize,
}

impl MatchScore {
    /// Sum of all signals.
    pub fn total(&self) -> f64 {
        self.word_match + self.position + self.quality + self.suspicion
    }

    /// JSON representation used in tool payloads.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "word_match": round_score(self.word_match),
            "position": round_score(self.position),
            "quality": round_score(self.quality),
            "suspicion": round_score(self.suspicion),
            "matched_words": self.matched_words,
        })
    }
}

/// Score a name against a query.
///
/// Returns `None` when no query word occurs in the name.
pub fn score_name(name: &str, query: &Query) -> Option<MatchScore> {
    let tokens = tokenize(name);
    let hits: Vec<WordHit> = query
        .words()
        .iter()
        .filter_map(|word| locate_word(word, &tokens))
        .collect();

    if hits.is_empty() {
        return None;
    }

    Some(MatchScore {
        word_match: word_match_score(&hits),
        position: position_score(&hits),
        quality: quality_score(&tokens),
        suspicion: suspicion_score(&tokens),
        matched_words: hits.len(),
    })
}

pub fn round_score(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
