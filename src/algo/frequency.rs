use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Occurrence counts per token, in first-appearance order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyTable {
    /// (token, count) in the order tokens were first seen
    entries: Vec<(String, usize)>,
    /// token -> position in `entries`
    index: HashMap<String, usize>,
    total: usize,
}

impl FrequencyTable {
    /// Count every token in the list.
    pub fn from_tokens(tokens: &[String]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            match index.get(token) {
                Some(&pos) => entries[pos].1 += 1,
                None => {
                    index.insert(token.clone(), entries.len());
                    entries.push((token.clone(), 1));
                }
            }
        }
        Self {
            entries,
            index,
            total: tokens.len(),
        }
    }

    pub fn count(&self, token: &str) -> usize {
        self.index
            .get(token)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Sum of all counts, i.e. the number of tokens counted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate (token, count) in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(w, c)| (w.as_str(), *c))
    }

    /// Entries sorted by count descending. The sort is stable, so tokens with
    /// equal counts keep their first-appearance order.
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// The `n` most frequent tokens (bar chart data).
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        self.sorted()
            .into_iter()
            .take(n)
            .map(|(w, c)| (w.to_string(), c))
            .collect()
    }

    /// Up to `max_words` weights for a word cloud renderer.
    pub fn cloud_weights(&self, max_words: usize) -> Vec<(String, usize)> {
        self.most_common(max_words)
    }

    /// Build the ranked table: rank 1 is the most frequent token.
    pub fn ranked_rows(&self) -> Vec<RankedRow> {
        let total = self.total as f64;
        self.sorted()
            .into_iter()
            .enumerate()
            .map(|(i, (word, count))| RankedRow {
                rank: i + 1,
                word: word.to_string(),
                frequency: count,
                percentage: round2(count as f64 / total * 100.0),
            })
            .collect()
    }
}

/// One line of the ranked frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: usize,
    pub word: String,
    pub frequency: usize,
    /// Share of all tokens, in percent, rounded to 2 decimals.
    pub percentage: f64,
}

impl RankedRow {
    /// The percentage as displayed and exported, e.g. `"40.0 %"`.
    pub fn percent_label(&self) -> String {
        format!("{} %", PercentValue(self.percentage))
    }
}

/// Percent cell format: shortest round-trip decimal with
/// at least one fractional digit (`40.0`, `33.33`, `0.5`).
struct PercentValue(f64);

impl fmt::Display for PercentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Parse a label produced by [`RankedRow::percent_label`].
pub fn parse_percent_label(label: &str) -> Option<f64> {
    label.trim().trim_end_matches('%').trim_end().parse().ok()
}

/// Round half away from zero to 2 decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convenience: count tokens and rank them in one step.
pub fn word_stats(tokens: &[String]) -> (FrequencyTable, Vec<RankedRow>) {
    let table = FrequencyTable::from_tokens(tokens);
    let rows = table.ranked_rows();
    (table, rows)
}
