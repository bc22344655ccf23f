//! Chart data and fixed-width terminal renderings of an analysis.

use serde::Serialize;

use crate::algo::frequency::RankedRow;
use crate::algo::keywords::Keyword;
use crate::session::WordCount;

/// Width of the longest bar, in characters.
pub const BAR_WIDTH: usize = 40;

/// One page of the ranked table. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub number: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub rows: &'a [RankedRow],
}

/// Slice out page `number` of `rows`. Page 0 and pages past the end are empty.
pub fn page(rows: &[RankedRow], number: usize, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let page_count = rows.len().div_ceil(page_size);
    let slice = if number == 0 || number > page_count {
        &rows[..0]
    } else {
        let start = (number - 1) * page_size;
        let end = (start + page_size).min(rows.len());
        &rows[start..end]
    };
    Page {
        number,
        page_count,
        page_size,
        total_rows: rows.len(),
        rows: slice,
    }
}

/// Keywords ordered for a horizontal bar chart: the best keyword is drawn
/// last, which puts it on top.
pub fn keyword_chart(keywords: &[Keyword]) -> Vec<Keyword> {
    keywords.iter().rev().cloned().collect()
}

/// Horizontal bar chart of word counts, longest bar first.
pub fn bar_chart(words: &[WordCount], width: usize) -> String {
    let max = words.iter().map(|w| w.count).max().unwrap_or(0);
    let label = words.iter().map(|w| w.word.len()).max().unwrap_or(0);
    let mut out = String::new();
    for w in words {
        let bar = scaled(w.count as f64, max as f64, width);
        out.push_str(&format!(
            "{:<label$} {} {}\n",
            w.word,
            "#".repeat(bar),
            w.count
        ));
    }
    out
}

/// Terminal rendering of keyword scores, highest on top.
pub fn keyword_bars(keywords: &[Keyword], width: usize) -> String {
    let label = keywords.iter().map(|k| k.phrase.len()).max().unwrap_or(0);
    let mut out = String::new();
    for k in keywords {
        let bar = scaled(k.score, 1.0, width);
        out.push_str(&format!(
            "{:<label$} {} {:.4}\n",
            k.phrase,
            "#".repeat(bar),
            k.score
        ));
    }
    out
}

/// Fixed-width table of one page, with a footer naming the page.
pub fn table(page: &Page<'_>) -> String {
    let word_width = page
        .rows
        .iter()
        .map(|r| r.word.len())
        .max()
        .unwrap_or(0)
        .max("Word".len());
    let mut out = format!(
        "{:>6}  {:<word_width$}  {:>9}  {:>9}\n",
        "Rank", "Word", "Frequency", "% of Text"
    );
    for row in page.rows {
        out.push_str(&format!(
            "{:>6}  {:<word_width$}  {:>9}  {:>9}\n",
            row.rank,
            row.word,
            row.frequency,
            row.percent_label()
        ));
    }
    out.push_str(&format!(
        "page {} of {} ({} rows)\n",
        page.number, page.page_count, page.total_rows
    ));
    out
}

/// Bar length for `value` relative to `max`; any non-zero value gets at least one mark.
fn scaled(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    (((value / max) * width as f64).round() as usize).clamp(1, width.max(1))
}
