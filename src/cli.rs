use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use word_frequency::config::AnalyzerConfig;
use word_frequency::ops;
use word_frequency::render;
use word_frequency::session::{AnalyzeOutcome, LoadOutcome, Session};
use word_frequency::source::InputSource;

#[derive(Parser)]
#[command(
    name = "wordfreq",
    version,
    about = "Word frequencies, keywords, and CSV export for novels, PDFs, pasted text, and web pages"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long)]
    mcp: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the text comes from. Without a flag, text is read from stdin.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
struct SourceArgs {
    /// Novel title, resolved through the book catalog
    #[arg(long)]
    title: Option<String>,
    /// Web page or plain-text URL
    #[arg(long)]
    url: Option<String>,
    /// PDF document
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Text given directly on the command line
    #[arg(long)]
    text: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load text and show word statistics, keywords, and the ranked table
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Table page to show (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        /// Number of keywords (overrides config)
        #[arg(short, long)]
        keywords: Option<usize>,
        /// Number of words in the bar chart (overrides config)
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Find the plain-text download URL for a novel title
    Resolve {
        /// Title to search for
        title: String,
    },
    /// Extract keywords from text
    Keywords {
        #[command(flatten)]
        source: SourceArgs,
        /// Number of keywords
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Export the ranked word table as CSV
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Write the CSV to this file instead of printing a data URI
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print an HTML download link instead of the bare data URI
        #[arg(long)]
        html: bool,
    },
    /// Show how a URL is parsed for fetching and keyed in the cache
    NormalizeUrl {
        /// URL to normalize
        url: String,
    },
    /// Manage the persistent fetch cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cached documents
    Info {
        /// Cache database path (defaults to cache.path from config)
        #[arg(long)]
        path: Option<String>,
    },
    /// Remove cached documents
    Clear {
        /// Cache database path (defaults to cache.path from config)
        #[arg(long)]
        path: Option<String>,
        /// Only remove entries whose key starts with this (e.g. a host)
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::from_file(path)
            .unwrap_or_else(|e| fail(&format!("{}: {e}", path.display()))),
        None => AnalyzerConfig::default(),
    };

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(&format!("failed to create tokio runtime: {e}")));
        rt.block_on(async {
            if let Err(e) = word_frequency::mcp::serve_stdio(config).await {
                fail(&format!("MCP server error: {e}"));
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let command = cli
        .command
        .unwrap_or_else(|| fail("No subcommand provided. Run `wordfreq --help` for usage."));

    match command {
        Commands::Analyze {
            source,
            json,
            page,
            keywords,
            top,
        } => {
            let mut config = config;
            if let Some(n) = keywords {
                config.analysis.keywords = n;
            }
            if let Some(n) = top {
                config.analysis.top_words = n;
            }
            cmd_analyze(&config, source, json, page)
        }
        Commands::Resolve { title } => cmd_resolve(&config, &title),
        Commands::Keywords { source, count } => cmd_keywords(&config, source, count),
        Commands::Export {
            source,
            output,
            html,
        } => cmd_export(&config, source, output, html),
        Commands::NormalizeUrl { url } => cmd_normalize_url(&url),
        Commands::Cache { action } => cmd_cache(&config, action),
    }
}

/// Logs go to stderr; stdout carries results (and MCP frames).
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(&format!("failed to serialize output: {e}")),
    }
}

fn read_stdin() -> String {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        fail(&format!("failed to read stdin: {e}"));
    }
    buf
}

impl SourceArgs {
    fn into_source(self) -> InputSource {
        if let Some(title) = self.title {
            InputSource::ByTitle { title }
        } else if let Some(url) = self.url {
            InputSource::ByUrl { url }
        } else if let Some(path) = self.pdf {
            let bytes = fs::read(&path)
                .unwrap_or_else(|e| fail(&format!("{}: {e}", path.display())));
            InputSource::ByUpload { bytes }
        } else if let Some(text) = self.text {
            InputSource::ByPaste { text }
        } else {
            InputSource::ByPaste { text: read_stdin() }
        }
    }
}

/// Load the source into a fresh session, exiting on anything but success.
fn load_session(config: &AnalyzerConfig, source: SourceArgs) -> Session {
    let fetcher = ops::build_fetcher(config).unwrap_or_else(|e| fail(&e));
    let mut session = Session::new();
    match session.load(source.into_source(), &fetcher, &config.fetch) {
        LoadOutcome::Loaded { .. } => session,
        LoadOutcome::NotFound => fail("Novel not found in the catalog."),
        LoadOutcome::Failed { message } => fail(&format!("Failed to load text: {message}")),
        LoadOutcome::Empty => fail("No text to analyze."),
    }
}

fn cmd_analyze(config: &AnalyzerConfig, source: SourceArgs, json: bool, page: usize) {
    let session = load_session(config, source);

    if json {
        print_json(&ops::op_analyze(&session, config, page));
        return;
    }

    let extractor = ops::build_extractor(config);
    let report = match session.analyze(&extractor, &config.analysis) {
        AnalyzeOutcome::Analyzed(report) => report,
        AnalyzeOutcome::NoValidWords => {
            fail("No valid words found after cleaning the text. Please check your input.")
        }
        AnalyzeOutcome::NoText => fail("No text to analyze."),
    };

    println!(
        "{} words, {} unique\n",
        report.total_words, report.unique_words
    );
    println!("Top {} words", report.top_words.len());
    print!("{}", render::bar_chart(&report.top_words, render::BAR_WIDTH));
    if !report.keywords.is_empty() {
        println!("\nKeywords");
        print!("{}", render::keyword_bars(&report.keywords, render::BAR_WIDTH));
    }
    println!();
    print!(
        "{}",
        render::table(&render::page(&report.rows, page, config.analysis.page_size))
    );
}

fn cmd_resolve(config: &AnalyzerConfig, title: &str) {
    let fetcher = ops::build_fetcher(config).unwrap_or_else(|e| fail(&e));
    match ops::op_resolve_title(&fetcher, config, title) {
        Ok(result) => print_json(&result),
        Err(e) => fail(&e),
    }
}

fn cmd_keywords(config: &AnalyzerConfig, source: SourceArgs, count: Option<usize>) {
    let session = load_session(config, source);
    let text = session.text().unwrap_or_default();
    let count = count.unwrap_or(config.analysis.keywords);
    print_json(&ops::op_keywords(text, config, count));
}

fn cmd_export(config: &AnalyzerConfig, source: SourceArgs, output: Option<PathBuf>, html: bool) {
    let session = load_session(config, source);
    let export = ops::op_export_csv(&session, config).unwrap_or_else(|e| fail(&e));
    let field = |name: &str| export[name].as_str().unwrap_or_default().to_string();

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, field("csv")) {
                fail(&format!("{}: {e}", path.display()));
            }
            eprintln!("wrote {} rows to {}", export["rows"], path.display());
        }
        None if html => println!("{}", field("html")),
        None => println!("{}", field("data_uri")),
    }
}

fn cmd_normalize_url(url: &str) {
    match ops::op_normalize_url(url) {
        Ok(result) => print_json(&result),
        Err(e) => fail(&e),
    }
}

fn cmd_cache(config: &AnalyzerConfig, action: CacheAction) {
    let resolve_path = |path: Option<String>| {
        path.or_else(|| config.cache.path.clone())
            .unwrap_or_else(|| fail("No cache path. Pass --path or set cache.path in the config."))
    };
    let result = match action {
        CacheAction::Info { path } => ops::op_cache_info(&resolve_path(path)),
        CacheAction::Clear { path, prefix } => {
            ops::op_cache_clear(&resolve_path(path), prefix.as_deref())
        }
    };
    match result {
        Ok(value) => print_json(&value),
        Err(e) => fail(&e),
    }
}
