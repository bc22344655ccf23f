use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static NON_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s\x1c-\x1f]").expect("static pattern"));

/// Normalize raw text into the token list used for frequency counting.
///
/// Lowercases, drops every character that is not an ASCII letter or
/// whitespace, splits on whitespace runs and removes English stopwords.
/// The information separators U+001C..=U+001F count as whitespace.
/// Non-Latin scripts are discarded entirely. Lines are cleaned in parallel;
/// the output keeps the original token order.
pub fn clean_text(text: &str) -> Vec<String> {
    text.par_lines()
        .flat_map_iter(|line| {
            let lower = line.to_lowercase();
            NON_LETTER
                .replace_all(&lower, "")
                .split(is_separator)
                .filter(|w| !w.is_empty() && !is_stopword(w))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Tokenize text into lowercase Unicode word tokens for keyword scoring,
/// filtering stopwords and single-character tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 2 && !is_stopword(w))
        .collect()
}

/// Generate word n-grams from a token list. Returns nothing when the list is
/// shorter than `n`.
pub fn word_ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// NLTK English stopwords. Contractions appear only as the fragments left
/// once apostrophes are stripped ("don", "t", "ll", ...).
pub fn is_stopword(word: &str) -> bool {
    matches!(
        word,
        "i" | "me" | "my" | "myself" | "we" | "our" | "ours" | "ourselves" | "you" | "your"
        | "yours" | "yourself" | "yourselves" | "he" | "him" | "his" | "himself" | "she"
        | "her" | "hers" | "herself" | "it" | "its" | "itself" | "they" | "them" | "their"
        | "theirs" | "themselves" | "what" | "which" | "who" | "whom" | "this" | "that"
        | "these" | "those" | "am" | "is" | "are" | "was" | "were" | "be" | "been" | "being"
        | "have" | "has" | "had" | "having" | "do" | "does" | "did" | "doing" | "a" | "an"
        | "the" | "and" | "but" | "if" | "or" | "because" | "as" | "until" | "while" | "of"
        | "at" | "by" | "for" | "with" | "about" | "against" | "between" | "into" | "through"
        | "during" | "before" | "after" | "above" | "below" | "to" | "from" | "up" | "down"
        | "in" | "out" | "on" | "off" | "over" | "under" | "again" | "further" | "then"
        | "once" | "here" | "there" | "when" | "where" | "why" | "how" | "all" | "any"
        | "both" | "each" | "few" | "more" | "most" | "other" | "some" | "such" | "no" | "nor"
        | "not" | "only" | "own" | "same" | "so" | "than" | "too" | "very" | "s" | "t" | "can"
        | "will" | "just" | "don" | "should" | "now" | "d" | "ll" | "m" | "o" | "re" | "ve"
        | "y" | "ain" | "aren" | "couldn" | "didn" | "doesn" | "hadn" | "hasn" | "haven"
        | "isn" | "ma" | "mightn" | "mustn" | "needn" | "shan" | "shouldn" | "wasn" | "weren"
        | "won" | "wouldn"
    )
}
