//! Where text comes from: catalog titles, PDF uploads, pasted text, URLs.

pub mod catalog;
pub mod fetch;
pub mod pdf;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algo::url_normalize::parse_fetch_url;
use crate::config::FetchConfig;
use crate::error::Result;
use fetch::Fetch;

/// The four ways text can enter a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Title,
    Upload,
    Paste,
    Url,
}

impl InputMethod {
    pub const ALL: [InputMethod; 4] = [Self::Title, Self::Upload, Self::Paste, Self::Url];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Upload => "upload",
            Self::Paste => "paste",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "novel" => Ok(Self::Title),
            "upload" | "pdf" => Ok(Self::Upload),
            "paste" | "text" => Ok(Self::Paste),
            "url" => Ok(Self::Url),
            other => Err(format!(
                "unknown input method '{other}' (expected title, upload, paste or url)"
            )),
        }
    }
}

/// One concrete input, carrying only what its method needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    ByTitle { title: String },
    ByUpload { bytes: Vec<u8> },
    ByPaste { text: String },
    ByUrl { url: String },
}

impl InputSource {
    pub fn method(&self) -> InputMethod {
        match self {
            Self::ByTitle { .. } => InputMethod::Title,
            Self::ByUpload { .. } => InputMethod::Upload,
            Self::ByPaste { .. } => InputMethod::Paste,
            Self::ByUrl { .. } => InputMethod::Url,
        }
    }
}

/// Produce the raw text for `source`.
///
/// `Ok(None)` is a catalog miss: the title search listed no results.
pub fn acquire(
    source: &InputSource,
    fetcher: &dyn Fetch,
    config: &FetchConfig,
) -> Result<Option<String>> {
    debug!(method = %source.method(), "acquiring text");
    match source {
        InputSource::ByTitle { title } => match catalog::resolve_title(fetcher, config, title)? {
            Some(url) => fetcher.fetch_text(&url).map(Some),
            None => Ok(None),
        },
        InputSource::ByUpload { bytes } => pdf::extract_text(bytes).map(Some),
        InputSource::ByPaste { text } => Ok(Some(text.clone())),
        InputSource::ByUrl { url } => {
            let url = parse_fetch_url(url)?;
            fetcher.fetch_text(&url).map(Some)
        }
    }
}
