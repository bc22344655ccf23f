//! Caller-owned session state and the text → report pipeline.
//!
//! A [`Session`] remembers which input method is selected and the last text
//! successfully loaded. Loading and analyzing never fail hard: every problem
//! is reported as an outcome value the surface can show to the user.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algo::frequency::{word_stats, RankedRow};
use crate::algo::keywords::{Keyword, KeywordExtractor};
use crate::algo::tokenizer;
use crate::config::{AnalysisConfig, FetchConfig};
use crate::source::fetch::Fetch;
use crate::source::{acquire, InputMethod, InputSource};

/// A word and its occurrence count, as fed to chart and cloud renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

impl From<(String, usize)> for WordCount {
    fn from((word, count): (String, usize)) -> Self {
        Self { word, count }
    }
}

/// Everything derived from one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_words: usize,
    pub unique_words: usize,
    pub rows: Vec<RankedRow>,
    pub top_words: Vec<WordCount>,
    pub cloud: Vec<WordCount>,
    pub keywords: Vec<Keyword>,
}

impl AnalysisReport {
    /// Run the full pipeline on `text`. `None` when cleaning leaves no words,
    /// in which case aggregation and keyword extraction are skipped.
    pub fn build(
        text: &str,
        extractor: &dyn KeywordExtractor,
        config: &AnalysisConfig,
    ) -> Option<Self> {
        let tokens = tokenizer::clean_text(text);
        if tokens.is_empty() {
            return None;
        }
        let (table, rows) = word_stats(&tokens);
        let report = Self {
            total_words: table.total(),
            unique_words: table.len(),
            top_words: table
                .most_common(config.top_words)
                .into_iter()
                .map(WordCount::from)
                .collect(),
            cloud: table
                .cloud_weights(config.cloud_words)
                .into_iter()
                .map(WordCount::from)
                .collect(),
            keywords: extractor.extract(text, config.keywords),
            rows,
        };
        debug!(
            total = report.total_words,
            unique = report.unique_words,
            keywords = report.keywords.len(),
            "analysis complete"
        );
        Some(report)
    }
}

/// Result of a load attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { method: InputMethod, chars: usize },
    /// The catalog search listed no results.
    NotFound,
    /// Network, extraction or input error; nothing was loaded.
    Failed { message: String },
    /// The source produced no text. It still replaces the previous text,
    /// so a following analysis reports no valid words.
    Empty,
}

/// Result of an analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum AnalyzeOutcome {
    Analyzed(AnalysisReport),
    /// Text was loaded but nothing survived cleaning.
    NoValidWords,
    /// No text is loaded for the selected method.
    NoText,
}

#[derive(Debug, Clone)]
struct LoadedText {
    method: InputMethod,
    text: String,
}

/// Interactive state: selected input method plus the current text.
#[derive(Debug, Clone)]
pub struct Session {
    selected: InputMethod,
    current: Option<LoadedText>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            selected: InputMethod::Title,
            current: None,
        }
    }

    pub fn selected(&self) -> InputMethod {
        self.selected
    }

    pub fn select(&mut self, method: InputMethod) {
        if method != self.selected {
            debug!(from = %self.selected, to = %method, "input method changed");
        }
        self.selected = method;
    }

    /// The method that produced the current text, if any.
    pub fn loaded_method(&self) -> Option<InputMethod> {
        self.current.as_ref().map(|c| c.method)
    }

    /// Current text, visible only while its producing method is selected.
    pub fn text(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|c| c.method == self.selected)
            .map(|c| c.text.as_str())
    }

    /// Acquire text from `source`. The source's method becomes the selected
    /// one; any text it yields, blank included, replaces the previous text.
    pub fn load(
        &mut self,
        source: InputSource,
        fetcher: &dyn Fetch,
        config: &FetchConfig,
    ) -> LoadOutcome {
        let method = source.method();
        self.select(method);

        let text = match acquire(&source, fetcher, config) {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!(%method, "source not found");
                return LoadOutcome::NotFound;
            }
            Err(e) => {
                warn!(%method, error = %e, "load failed");
                return LoadOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };

        let blank = text.trim().is_empty();
        let chars = text.chars().count();
        self.current = Some(LoadedText { method, text });
        if blank {
            info!(%method, "source produced no text");
            return LoadOutcome::Empty;
        }
        info!(%method, chars, "text loaded");
        LoadOutcome::Loaded { method, chars }
    }

    /// Analyze the visible text.
    pub fn analyze(
        &self,
        extractor: &dyn KeywordExtractor,
        config: &AnalysisConfig,
    ) -> AnalyzeOutcome {
        let Some(text) = self.text() else {
            return AnalyzeOutcome::NoText;
        };
        match AnalysisReport::build(text, extractor, config) {
            Some(report) => AnalyzeOutcome::Analyzed(report),
            None => {
                warn!("no valid words after cleaning");
                AnalyzeOutcome::NoValidWords
            }
        }
    }

    /// Forget the loaded text; the selection is kept.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
