//! Title → full-text URL resolution against the book catalog.
//!
//! The catalog search page lists results as `<li class="booklink">` items; the
//! first anchor inside the first item is the book's detail path
//! (`/ebooks/1342`). Appending the text suffix gives the plain-text download.

use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::fetch::Fetch;
use crate::config::FetchConfig;
use crate::error::{Result, WordFreqError};

const BOOKLINK: &str = "li.booklink";
const ANCHOR: &str = "a";

/// Build the catalog search URL for a title. Spaces are form-encoded as `+`.
pub fn search_url(config: &FetchConfig, title: &str) -> Result<Url> {
    let title = title.trim();
    if title.is_empty() {
        return Err(WordFreqError::EmptyInput("title"));
    }
    let base = config.catalog_base.trim_end_matches('/');
    let endpoint = format!("{base}/ebooks/search/");
    Url::parse_with_params(&endpoint, &[("query", title)]).map_err(|source| {
        WordFreqError::InvalidUrl {
            input: endpoint,
            source,
        }
    })
}

/// Extract the download URL of the first search result, if any.
pub fn parse_first_result(html: &str, config: &FetchConfig) -> Result<Option<Url>> {
    let booklink =
        Selector::parse(BOOKLINK).map_err(|e| WordFreqError::Selector(e.to_string()))?;
    let anchor = Selector::parse(ANCHOR).map_err(|e| WordFreqError::Selector(e.to_string()))?;
    let document = Html::parse_document(html);

    // Only the first result counts, even when it has no link.
    let Some(href) = document
        .select(&booklink)
        .next()
        .and_then(|item| item.select(&anchor).next())
        .and_then(|a| a.value().attr("href"))
    else {
        return Ok(None);
    };

    let base = Url::parse(&config.catalog_base).map_err(|source| WordFreqError::InvalidUrl {
        input: config.catalog_base.clone(),
        source,
    })?;
    let target = format!("{}{}", href.trim(), config.text_suffix);
    let url = base.join(&target).map_err(|source| WordFreqError::InvalidUrl {
        input: target,
        source,
    })?;
    Ok(Some(url))
}

/// Search the catalog for `title` and return the first result's text URL.
///
/// `Ok(None)` means the search succeeded but listed no results.
pub fn resolve_title<F: Fetch + ?Sized>(
    fetcher: &F,
    config: &FetchConfig,
    title: &str,
) -> Result<Option<Url>> {
    let search = search_url(config, title)?;
    debug!(%search, "catalog search");
    let html = fetcher.fetch_text(&search)?;
    let resolved = parse_first_result(&html, config)?;
    match &resolved {
        Some(url) => info!(title, %url, "title resolved"),
        None => info!(title, "no catalog result"),
    }
    Ok(resolved)
}
