//! Media types shared across planning and mummification.
//!
//! Every artifact records the media type of what it produces. Most files are
//! typed by extension through a static table; files with no (or an unknown)
//! extension can be typed by sniffing their leading bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid media type: {0:?}")]
pub struct InvalidMediaType(pub String);

/// An Internet media type such as `text/html`, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaType(String);

impl MediaType {
    pub const HTML: &'static str = "text/html";

    /// Build from a string known to be well-formed (the static table).
    fn known(essence: &str) -> Self {
        Self(essence.to_string())
    }

    pub fn html() -> Self {
        Self::known(Self::HTML)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The top-level type, e.g. `image` for `image/png`.
    pub fn top_level(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    pub fn is_image(&self) -> bool {
        self.top_level() == "image"
    }

    /// Look up the media type for a file extension (case-insensitive).
    pub fn for_extension(extension: &str) -> Option<Self> {
        let ext = extension.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, essence)| Self::known(essence))
    }

    /// Guess a media type from the first bytes of a file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let essence = if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            "image/png"
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "image/jpeg"
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            "image/gif"
        } else if bytes.starts_with(b"%PDF-") {
            "application/pdf"
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            "image/webp"
        } else if looks_like_html(bytes) {
            Self::HTML
        } else {
            return None;
        };
        Some(Self::known(essence))
    }
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(64)]).to_ascii_lowercase();
    let head = head.trim_start();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Extension → media type essence.
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("xml", "application/xml"),
    ("svg", "image/svg+xml"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/vnd.microsoft.icon"),
    ("pdf", "application/pdf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

impl FromStr for MediaType {
    type Err = InvalidMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.trim().to_ascii_lowercase();
        match essence.split_once('/') {
            Some((top, sub))
                if !top.is_empty()
                    && !sub.is_empty()
                    && !sub.contains('/')
                    && essence.chars().all(|c| !c.is_whitespace()) =>
            {
                Ok(Self(essence))
            }
            _ => Err(InvalidMediaType(s.to_string())),
        }
    }
}

impl TryFrom<String> for MediaType {
    type Error = InvalidMediaType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
