//! Shared operation wrappers for all interfaces (CLI, MCP).
//!
//! Each `op_*` function is a synchronous wrapper around the session, source
//! and `algo` modules. Output is `serde_json::Value` and errors are plain
//! strings, so neither clap nor rmcp types leak into the library.
//!
//! When the `cache` feature is enabled, the persistent fetch cache can be
//! inspected and cleared through `op_cache_info` / `op_cache_clear`.

use serde_json::{json, Value};
use tracing::warn;

use crate::algo::export;
use crate::algo::keywords::{KeywordExtractor, TfidfKeywords};
use crate::algo::url_normalize;
use crate::config::AnalyzerConfig;
use crate::error::WordFreqError;
use crate::render;
use crate::session::{AnalysisReport, AnalyzeOutcome, Session};
use crate::source::fetch::{CachedFetcher, Fetch, HttpFetcher};
use crate::source::{catalog, InputMethod, InputSource};

#[cfg(feature = "cache")]
use crate::algo::storage;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// The HTTP fetcher every surface uses: shared timeout, LRU in front, and the
/// persistent cache when configured.
pub fn build_fetcher(config: &AnalyzerConfig) -> Result<CachedFetcher<HttpFetcher>, String> {
    let http = HttpFetcher::new(&config.fetch).map_err(|e| e.to_string())?;
    CachedFetcher::from_config(http, config).map_err(|e| e.to_string())
}

/// The built-in keyword extractor, sized from config.
pub fn build_extractor(config: &AnalyzerConfig) -> TfidfKeywords {
    TfidfKeywords::new(config.analysis.keyword_ngram_max)
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn report_of(session: &Session, config: &AnalyzerConfig) -> Result<AnalysisReport, String> {
    match session.analyze(&build_extractor(config), &config.analysis) {
        AnalyzeOutcome::Analyzed(report) => Ok(report),
        AnalyzeOutcome::NoValidWords => {
            Err("No valid words found after cleaning the text".into())
        }
        AnalyzeOutcome::NoText => Err(format!(
            "No text loaded for input method '{}'",
            session.selected()
        )),
    }
}

// ── Session operations ───────────────────────────────────────────────────────

pub fn op_select_method(session: &mut Session, method: &str) -> Result<Value, String> {
    let method: InputMethod = method.parse()?;
    session.select(method);
    Ok(op_session(session))
}

pub fn op_load(
    session: &mut Session,
    source: InputSource,
    fetcher: &dyn Fetch,
    config: &AnalyzerConfig,
) -> Value {
    to_value(&session.load(source, fetcher, &config.fetch))
}

pub fn op_session(session: &Session) -> Value {
    json!({
        "selected": session.selected(),
        "loaded_method": session.loaded_method(),
        "text_visible": session.text().is_some(),
        "chars": session.text().map(|t| t.chars().count()),
    })
}

/// Analyze the visible text. On success the first table page and the keyword
/// chart order are included alongside the report.
pub fn op_analyze(session: &Session, config: &AnalyzerConfig, page: usize) -> Value {
    let outcome = session.analyze(&build_extractor(config), &config.analysis);
    let mut value = to_value(&outcome);
    if let (AnalyzeOutcome::Analyzed(report), Some(obj)) = (&outcome, value.as_object_mut()) {
        let table = render::page(&report.rows, page, config.analysis.page_size);
        obj.insert("page".into(), to_value(&table));
        obj.insert(
            "keyword_chart".into(),
            to_value(&render::keyword_chart(&report.keywords)),
        );
    }
    value
}

pub fn op_table_page(
    session: &Session,
    config: &AnalyzerConfig,
    page: usize,
) -> Result<Value, String> {
    let report = report_of(session, config)?;
    Ok(to_value(&render::page(
        &report.rows,
        page,
        config.analysis.page_size,
    )))
}

pub fn op_export_csv(session: &Session, config: &AnalyzerConfig) -> Result<Value, String> {
    let report = report_of(session, config)?;
    Ok(export_value(&report))
}

/// Export payloads for an already computed report.
pub fn export_value(report: &AnalysisReport) -> Value {
    let csv = export::encode_csv(&report.rows);
    json!({
        "filename": export::EXPORT_FILENAME,
        "rows": report.rows.len(),
        "data_uri": export::to_data_uri(&csv),
        "html": export::download_link(&report.rows),
        "csv": csv,
    })
}

// ── Stateless operations ─────────────────────────────────────────────────────

/// Keywords of arbitrary text, best first.
pub fn op_keywords(text: &str, config: &AnalyzerConfig, top_n: usize) -> Value {
    let keywords = build_extractor(config).extract(text, top_n);
    json!({
        "keywords": keywords,
        "chart": render::keyword_chart(&keywords),
    })
}

/// Catalog lookup without loading. A blank title is the caller's error; a
/// failed search means no URL is available and is reported in the result.
pub fn op_resolve_title(
    fetcher: &dyn Fetch,
    config: &AnalyzerConfig,
    title: &str,
) -> Result<Value, String> {
    match catalog::resolve_title(fetcher, &config.fetch, title) {
        Ok(url) => Ok(json!({
            "title": title.trim(),
            "found": url.is_some(),
            "url": url.map(|u| u.to_string()),
        })),
        Err(e @ WordFreqError::EmptyInput(_)) => Err(e.to_string()),
        Err(e) => {
            warn!(title = title.trim(), error = %e, "catalog search failed");
            Ok(json!({
                "title": title.trim(),
                "found": false,
                "url": null,
                "error": e.to_string(),
            }))
        }
    }
}

pub fn op_normalize_url(url: &str) -> Result<Value, String> {
    let parsed = url_normalize::parse_fetch_url(url).map_err(|e| e.to_string())?;
    Ok(json!({
        "original": url,
        "url": parsed.as_str(),
        "cache_key": url_normalize::cache_key(&parsed),
    }))
}

// ── Cache management ─────────────────────────────────────────────────────────

/// Show what is stored in a persistent fetch cache.
pub fn op_cache_info(
    #[cfg_attr(not(feature = "cache"), allow(unused))] cache_path: &str,
) -> Result<Value, String> {
    #[cfg(feature = "cache")]
    {
        let db = storage::CacheDb::open_or_create(cache_path, usize::MAX)
            .map_err(|e| e.to_string())?;
        let entries = db.info().map_err(|e| e.to_string())?;
        let size = db.db_size_bytes().map_err(|e| e.to_string())?;

        let entry_list: Vec<Value> = entries
            .iter()
            .map(|e| {
                json!({
                    "key": e.key,
                    "version": e.version,
                    "created_at": e.created_at,
                    "body_bytes": e.body_bytes,
                })
            })
            .collect();

        return Ok(json!({
            "path": cache_path,
            "size_bytes": size,
            "total": entries.len(),
            "entries": entry_list,
        }));
    }

    #[cfg(not(feature = "cache"))]
    Err("Cache feature not enabled. Build with --features cache".into())
}

/// Remove cached documents, optionally only those whose key starts with `prefix`.
pub fn op_cache_clear(
    #[cfg_attr(not(feature = "cache"), allow(unused))] cache_path: &str,
    #[cfg_attr(not(feature = "cache"), allow(unused))] prefix: Option<&str>,
) -> Result<Value, String> {
    #[cfg(feature = "cache")]
    {
        let db = storage::CacheDb::open_or_create(cache_path, usize::MAX)
            .map_err(|e| e.to_string())?;
        let deleted = db.invalidate(prefix).map_err(|e| e.to_string())?;
        return Ok(json!({
            "path": cache_path,
            "deleted": deleted,
            "prefix": prefix.unwrap_or("all"),
        }));
    }

    #[cfg(not(feature = "cache"))]
    Err("Cache feature not enabled. Build with --features cache".into())
}
