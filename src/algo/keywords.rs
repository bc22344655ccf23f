use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::tokenizer;

/// A ranked key phrase with its relevance score in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub phrase: String,
    pub score: f64,
}

/// Boundary for keyword extraction. Implementations receive the raw text and
/// return at most `top_n` phrases, best first.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str, top_n: usize) -> Vec<Keyword>;
}

/// Segment-level document frequencies for IDF weighting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentCorpus {
    /// term -> number of segments containing it
    doc_freq: HashMap<String, u32>,
    /// term -> occurrences across all segments
    term_counts: HashMap<String, u32>,
    num_segments: u32,
    total_terms: u32,
}

impl SegmentCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one segment (as candidate terms) to the corpus.
    pub fn add_segment(&mut self, terms: &[String]) {
        let mut seen: HashSet<&str> = HashSet::new();
        for term in terms {
            *self.term_counts.entry(term.clone()).or_insert(0) += 1;
            if seen.insert(term.as_str()) {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        self.num_segments += 1;
        self.total_terms += terms.len() as u32;
    }

    /// IDF for a term: ln((N - df + 0.5) / (df + 0.5) + 1)
    pub fn idf(&self, term: &str) -> f64 {
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        let n = self.num_segments as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Whole-text weight of every term: tf * (1 + idf).
    pub fn weights(&self) -> HashMap<String, f64> {
        if self.total_terms == 0 {
            return HashMap::new();
        }
        let total = self.total_terms as f64;
        self.term_counts
            .iter()
            .map(|(term, &count)| {
                let tf = count as f64 / total;
                (term.clone(), tf * (1.0 + self.idf(term)))
            })
            .collect()
    }

    /// Top-N terms, scores scaled so the best term scores 1.0. Ties are broken
    /// alphabetically.
    pub fn top_terms(&self, n: usize) -> Vec<(String, f64)> {
        let mut scored: Vec<(String, f64)> = self.weights().into_iter().collect();
        let max = scored.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return Vec::new();
        }
        for (_, s) in scored.iter_mut() {
            *s = round4(*s / max);
        }
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);
        scored
    }

    pub fn num_segments(&self) -> u32 {
        self.num_segments
    }
}

/// Built-in extractor: TF-IDF over paragraphs (or sentences for single-block
/// text), candidates are word n-grams up to `max_ngram` words.
#[derive(Debug, Clone)]
pub struct TfidfKeywords {
    pub max_ngram: usize,
}

impl TfidfKeywords {
    pub fn new(max_ngram: usize) -> Self {
        Self {
            max_ngram: max_ngram.max(1),
        }
    }

    pub fn corpus(&self, text: &str) -> SegmentCorpus {
        let mut corpus = SegmentCorpus::new();
        for segment in segments(text) {
            let tokens = tokenizer::tokenize(segment);
            let mut terms: Vec<String> = Vec::new();
            for n in 1..=self.max_ngram {
                terms.extend(tokenizer::word_ngrams(&tokens, n));
            }
            corpus.add_segment(&terms);
        }
        corpus
    }
}

impl Default for TfidfKeywords {
    fn default() -> Self {
        Self::new(1)
    }
}

impl KeywordExtractor for TfidfKeywords {
    fn extract(&self, text: &str, top_n: usize) -> Vec<Keyword> {
        self.corpus(text)
            .top_terms(top_n)
            .into_iter()
            .map(|(phrase, score)| Keyword { phrase, score })
            .collect()
    }
}

/// Split text into paragraphs on blank lines; fall back to sentences when
/// there is only one paragraph.
pub fn segments(text: &str) -> Vec<&str> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.len() >= 2 {
        return paragraphs;
    }
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
