use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};
use url::Url;
use word_frequency::algo::export;
use word_frequency::config::AnalyzerConfig;
use word_frequency::ops;
use word_frequency::session::Session;
use word_frequency::source::fetch::{CachedFetcher, Fetch};
use word_frequency::source::InputSource;
use word_frequency::{Result, WordFreqError};

const CAT: &str = "The cat sat on the mat. The cat ran.";

const SEARCH_HTML: &str = r#"
<html><body><ul class="results">
  <li class="booklink"><a class="link" href="/ebooks/11">Alice's Adventures in Wonderland</a></li>
</ul></body></html>"#;

const ALICE: &str = "Alice was beginning to get very tired of sitting by her sister on the bank.\n\n\
    Alice had nothing to do: once or twice she had peeped into the book her sister was reading.\n\n\
    The rabbit ran by, and Alice followed the rabbit down the hole.";

/// Canned pages keyed by exact URL; anything else is a 404.
struct StubFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn gutenberg() -> Self {
        Self::new(&[
            (
                "https://www.gutenberg.org/ebooks/search/?query=alice+in+wonderland",
                SEARCH_HTML,
            ),
            ("https://www.gutenberg.org/ebooks/11.txt.utf-8", ALICE),
            ("https://example.com/cat.txt", CAT),
        ])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for StubFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| WordFreqError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn loaded(text: &str) -> Session {
    let mut session = Session::new();
    let outcome = ops::op_load(
        &mut session,
        InputSource::ByPaste { text: text.into() },
        &StubFetcher::new(&[]),
        &AnalyzerConfig::default(),
    );
    assert_eq!(outcome["status"], "loaded");
    session
}

#[test]
fn ops_load_title_then_analyze() {
    let config = AnalyzerConfig::default();
    let fetcher = StubFetcher::gutenberg();
    let mut session = Session::new();

    let outcome = ops::op_load(
        &mut session,
        InputSource::ByTitle {
            title: "alice in wonderland".into(),
        },
        &fetcher,
        &config,
    );
    assert_eq!(outcome["status"], "loaded");
    assert_eq!(outcome["method"], "title");
    assert_eq!(fetcher.calls(), 2);

    let result = ops::op_analyze(&session, &config, 1);
    assert_eq!(result["status"], "analyzed");
    let report = &result["report"];
    assert_eq!(report["rows"][0]["word"], "alice");
    assert_eq!(report["rows"][0]["rank"], 1);
    assert!(report["keywords"].as_array().unwrap().len() <= 5);
    assert!(result["page"]["rows"].as_array().unwrap().len() <= 20);
    assert_eq!(result["page"]["number"], 1);
}

#[test]
fn ops_load_unknown_title_is_not_found() {
    let fetcher = StubFetcher::new(&[(
        "https://www.gutenberg.org/ebooks/search/?query=qwertyuiop",
        "<html><body><p>No records found.</p></body></html>",
    )]);
    let mut session = Session::new();
    let outcome = ops::op_load(
        &mut session,
        InputSource::ByTitle {
            title: "qwertyuiop".into(),
        },
        &fetcher,
        &AnalyzerConfig::default(),
    );
    assert_eq!(outcome, json!({"status": "not_found"}));
}

#[test]
fn ops_load_url_failure_is_reported() {
    let mut session = Session::new();
    let outcome = ops::op_load(
        &mut session,
        InputSource::ByUrl {
            url: "https://example.com/gone".into(),
        },
        &StubFetcher::new(&[]),
        &AnalyzerConfig::default(),
    );
    assert_eq!(outcome["status"], "failed");
    assert!(outcome["message"].as_str().unwrap().contains("404"));
}

#[test]
fn ops_analyze_cat_example() {
    let session = loaded(CAT);
    let result = ops::op_analyze(&session, &AnalyzerConfig::default(), 1);
    let rows = result["report"]["rows"].as_array().unwrap();
    let words: Vec<&str> = rows.iter().map(|r| r["word"].as_str().unwrap()).collect();
    assert_eq!(words, ["cat", "sat", "mat", "ran"]);
    assert_eq!(rows[0]["frequency"], 2);
    assert_eq!(rows[0]["percentage"], 40.0);
    assert_eq!(rows[1]["percentage"], 20.0);
    assert_eq!(result["report"]["total_words"], 5);
    assert_eq!(result["report"]["unique_words"], 4);
}

#[test]
fn ops_analyze_without_text() {
    let result = ops::op_analyze(&Session::new(), &AnalyzerConfig::default(), 1);
    assert_eq!(result, json!({"status": "no_text"}));
}

#[test]
fn ops_analyze_only_stopwords() {
    let session = loaded("The and of, to be or not to be!");
    let result = ops::op_analyze(&session, &AnalyzerConfig::default(), 1);
    assert_eq!(result["status"], "no_valid_words");
    assert!(result.get("page").is_none());
}

#[test]
fn ops_keyword_chart_is_reversed() {
    let session = loaded(ALICE);
    let result = ops::op_analyze(&session, &AnalyzerConfig::default(), 1);
    let keywords = result["report"]["keywords"].as_array().unwrap();
    let chart = result["keyword_chart"].as_array().unwrap();
    assert_eq!(keywords.len(), chart.len());
    assert_eq!(keywords.first(), chart.last());
}

#[test]
fn ops_select_method_hides_text() {
    let mut session = loaded(CAT);
    let state = ops::op_select_method(&mut session, "url").unwrap();
    assert_eq!(state["selected"], "url");
    assert_eq!(state["loaded_method"], "paste");
    assert_eq!(state["text_visible"], false);

    let result = ops::op_analyze(&session, &AnalyzerConfig::default(), 1);
    assert_eq!(result["status"], "no_text");

    assert!(ops::op_select_method(&mut session, "telegraph").is_err());
}

#[test]
fn ops_table_page_paginates() {
    let text: String = (0..45u8)
        .map(|i| format!("zq{}{} ", (b'a' + i / 26) as char, (b'a' + i % 26) as char))
        .collect();
    let session = loaded(&text);
    let config = AnalyzerConfig::default();

    let first = ops::op_table_page(&session, &config, 1).unwrap();
    assert_eq!(first["page_count"], 3);
    assert_eq!(first["rows"].as_array().unwrap().len(), 20);
    let third = ops::op_table_page(&session, &config, 3).unwrap();
    assert_eq!(third["rows"].as_array().unwrap().len(), 5);
    let past = ops::op_table_page(&session, &config, 4).unwrap();
    assert!(past["rows"].as_array().unwrap().is_empty());
}

#[test]
fn ops_export_round_trips() {
    let session = loaded(CAT);
    let config = AnalyzerConfig::default();
    let exported = ops::op_export_csv(&session, &config).unwrap();

    assert_eq!(exported["filename"], "word_list.csv");
    let csv = exported["csv"].as_str().unwrap();
    assert!(csv.starts_with("Rank,Word,Frequency,% of Text\n"));
    assert!(csv.contains("1,cat,2,40.0 %"));

    let uri = exported["data_uri"].as_str().unwrap();
    assert!(uri.starts_with("data:file/csv;base64,"));
    let decoded = export::decode_data_uri(uri).unwrap();
    assert_eq!(decoded, csv);

    let rows = export::decode_csv(&decoded).unwrap();
    let analyzed = ops::op_analyze(&session, &config, 1);
    let expected: Vec<Value> = analyzed["report"]["rows"].as_array().unwrap().clone();
    assert_eq!(serde_json::to_value(&rows).unwrap(), Value::Array(expected));

    let html = exported["html"].as_str().unwrap();
    assert!(html.contains("download=\"word_list.csv\""));
}

#[test]
fn ops_export_needs_text() {
    assert!(ops::op_export_csv(&Session::new(), &AnalyzerConfig::default()).is_err());
}

#[test]
fn ops_keywords_stateless() {
    let result = ops::op_keywords(ALICE, &AnalyzerConfig::default(), 3);
    let keywords = result["keywords"].as_array().unwrap();
    assert_eq!(keywords.len(), 3);
    // "rabbit" is concentrated in one paragraph, "alice" is spread over all three
    assert_eq!(keywords[0]["phrase"], "rabbit");
    assert_eq!(keywords[0]["score"], 1.0);
    assert_eq!(keywords[1]["phrase"], "alice");
    assert_eq!(keywords[2]["phrase"], "sister");
}

#[test]
fn ops_resolve_title() {
    let fetcher = StubFetcher::gutenberg();
    let result =
        ops::op_resolve_title(&fetcher, &AnalyzerConfig::default(), "  alice in wonderland ")
            .unwrap();
    assert_eq!(result["found"], true);
    assert_eq!(result["url"], "https://www.gutenberg.org/ebooks/11.txt.utf-8");
    assert_eq!(result["title"], "alice in wonderland");
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn ops_resolve_empty_title_rejected() {
    let fetcher = StubFetcher::gutenberg();
    assert!(ops::op_resolve_title(&fetcher, &AnalyzerConfig::default(), "").is_err());
    assert_eq!(fetcher.calls(), 0);
}

#[test]
fn ops_resolve_title_search_failure_is_not_found() {
    let fetcher = StubFetcher::new(&[]);
    let result =
        ops::op_resolve_title(&fetcher, &AnalyzerConfig::default(), "moby dick").unwrap();
    assert_eq!(result["found"], false);
    assert!(result["url"].is_null());
    assert!(result["error"].as_str().unwrap().contains("404"));
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn ops_normalize_url() {
    let result = ops::op_normalize_url("www.Example.COM/path/?utm_source=x&id=1#top").unwrap();
    assert_eq!(result["url"], "https://www.example.com/path/?utm_source=x&id=1");
    assert_eq!(result["cache_key"], "example.com/path?id=1");
    assert!(ops::op_normalize_url("ftp://example.com").is_err());
}

#[test]
fn cached_fetcher_reuses_documents_across_loads() {
    let config = AnalyzerConfig::default();
    let fetcher = CachedFetcher::new(StubFetcher::gutenberg(), config.cache.capacity);
    let mut session = Session::new();
    for url in ["https://example.com/cat.txt", "example.com/cat.txt#again"] {
        let outcome = ops::op_load(
            &mut session,
            InputSource::ByUrl { url: url.into() },
            &fetcher,
            &config,
        );
        assert_eq!(outcome["status"], "loaded");
    }
    assert_eq!(fetcher.inner().calls(), 1);
}

#[test]
fn ops_cache_ops_without_feature() {
    #[cfg(not(feature = "cache"))]
    {
        assert!(ops::op_cache_info("unused.db").is_err());
        assert!(ops::op_cache_clear("unused.db", None).is_err());
    }
    #[cfg(feature = "cache")]
    {
        let dir = std::env::temp_dir().join(format!("wordfreq-ops-{}.db", std::process::id()));
        let path = dir.to_string_lossy().into_owned();
        let info = ops::op_cache_info(&path).unwrap();
        assert_eq!(info["total"], 0);
        let cleared = ops::op_cache_clear(&path, None).unwrap();
        assert_eq!(cleared["deleted"], 0);
        let _ = std::fs::remove_file(&dir);
    }
}
