use serde::{Deserialize, Serialize};

use crate::text::word_count;

/// One artwork as shown in the art panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkResult {
    pub id: u64,
    /// IIIF image URL. Always set by the art client, which rejects records
    /// without an image id; optional for records built elsewhere.
    pub image_url: Option<String>,
    pub title: String,
    pub artist: String,
    pub date_range: String,
    pub origin: String,
    /// Artwork type ("Painting", "Print", ...).
    pub kind: String,
    /// Plain-text description (HTML already stripped).
    pub description: String,
    /// Style facet that produced this result.
    pub style: String,
}

/// Where a poem came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoemSource {
    /// Random author from the curated list, random title by that author.
    Curated,
    /// Single-call endpoint returning a ready-made poem.
    Serverless,
}

impl PoemSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Curated => "poetrydb",
            Self::Serverless => "random",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoemResult {
    pub author: String,
    pub title: String,
    pub lines: Vec<String>,
    pub source: PoemSource,
}

impl PoemResult {
    /// Poem body with one line per row.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| word_count(l)).sum()
    }
}

// ── Art Institute of Chicago wire types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub id: u64,
    #[serde(default)]
    pub api_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    pub data: ArtworkRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtworkRecord {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist_title: Option<String>,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub date_display: Option<String>,
    #[serde(default)]
    pub date_start: Option<i64>,
    #[serde(default)]
    pub date_end: Option<i64>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    #[serde(default)]
    pub artwork_type_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
}

impl ArtworkRecord {
    pub fn date_range(&self) -> String {
        if let Some(d) = self.date_display.as_deref().filter(|d| !d.trim().is_empty()) {
            return d.trim().to_string();
        }
        match (self.date_start, self.date_end) {
            (Some(s), Some(e)) if s != e => format!("{}\u{2013}{}", s, e),
            (Some(s), _) => s.to_string(),
            (None, Some(e)) => e.to_string(),
            (None, None) => String::new(),
        }
    }
}

// ── PoetryDB / serverless wire types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct TitleEntry {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PoetryDbPoem {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

/// PoetryDB answers misses with `200 {"status": 404, "reason": "Not found"}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PoetryDbReply<T> {
    Found(Vec<T>),
    Miss { status: u16, reason: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerlessPoem {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

// ── Serverless service wire types ────────────────────────────────────────────

/// Body posted to every serverless service.
#[derive(Debug, Clone, Serialize)]
pub struct PoemPayload<'a> {
    pub title: &'a str,
    #[serde(rename = "poet")]
    pub author: &'a str,
    #[serde(rename = "lines")]
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextReply {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoiceReply {
    #[serde(rename = "audioBase64", default)]
    pub audio_base64: Option<String>,
}
