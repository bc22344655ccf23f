//! MCP (Model Context Protocol) server for word_frequency.
//!
//! The server owns one [`Session`], so a client drives it like the
//! interactive tool: pick an input method, load text, then analyze, page
//! through the table, or export it. Blocking work (HTTP, PDF, analysis) runs
//! on tokio's blocking pool.
//!
//! Start with: `wordfreq --mcp`

use std::fs;
use std::sync::{Arc, Mutex};

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::AnalyzerConfig;
use crate::ops;
use crate::session::{LoadOutcome, Session};
use crate::source::fetch::Fetch;
use crate::source::InputSource;

// ── Parameter structs ───────────────────────────────────────────────────────
// `JsonSchema` is required by rmcp so that the tool's input schema is
// auto-generated for the AI client.

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SelectMethodParams {
    /// Input method: "title", "upload", "paste" or "url".
    pub method: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TitleParams {
    /// Novel title to search for in the book catalog.
    pub title: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UrlParams {
    /// URL of a web page or plain-text document. `https://` is assumed
    /// when no scheme is given.
    pub url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PdfParams {
    /// Path of a PDF file readable by the server.
    pub path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TextParams {
    /// Text to analyze.
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageParams {
    /// Table page to return, 1-based (default: 1).
    #[serde(default = "default_page")]
    pub page: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KeywordsParams {
    /// Text to extract keywords from. Defaults to the session's current text.
    pub text: Option<String>,
    /// Number of keywords (default: from config, normally 5).
    pub top_n: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NormalizeUrlParams {
    /// URL to normalize.
    pub url: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyParams {}

fn default_page() -> usize {
    1
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn json_text(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn reply(v: Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(json_text(&v))])
}

// ── MCP Server ──────────────────────────────────────────────────────────────

/// The MCP server: the tool router plus the session it operates on.
#[derive(Clone)]
pub struct WordFreqMcp {
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
    session: Arc<Mutex<Session>>,
    fetcher: Arc<dyn Fetch>,
    config: Arc<AnalyzerConfig>,
}

impl WordFreqMcp {
    /// Server with the HTTP fetcher described by `config`.
    pub fn new(config: AnalyzerConfig) -> Result<Self, String> {
        let fetcher = ops::build_fetcher(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: AnalyzerConfig, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            session: Arc::new(Mutex::new(Session::new())),
            fetcher,
            config: Arc::new(config),
        }
    }

    /// Run `f` against the session on the blocking pool.
    async fn run<F>(&self, f: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&mut Session, &dyn Fetch, &AnalyzerConfig) -> Result<Value, String>
            + Send
            + 'static,
    {
        let session = Arc::clone(&self.session);
        let fetcher = Arc::clone(&self.fetcher);
        let config = Arc::clone(&self.config);
        let result = tokio::task::spawn_blocking(move || {
            let mut session = session
                .lock()
                .map_err(|_| "session lock poisoned".to_string())?;
            f(&mut session, fetcher.as_ref(), &config)
        })
        .await
        .map_err(|e| McpError::internal_error(format!("task join error: {e}"), None))?
        .map_err(|e| McpError::invalid_params(e, None))?;
        Ok(reply(result))
    }

    async fn load(&self, source: InputSource) -> Result<CallToolResult, McpError> {
        self.run(move |session, fetcher, config| {
            Ok(ops::op_load(session, source, fetcher, config))
        })
        .await
    }
}

#[tool_router]
impl WordFreqMcp {
    // ── session ─────────────────────────────────────────────────────────

    #[tool(
        name = "select_method",
        description = "Select the input method: title, upload, paste or url. Loaded text stays hidden until its own method is selected again."
    )]
    async fn select_method(
        &self,
        params: Parameters<SelectMethodParams>,
    ) -> Result<CallToolResult, McpError> {
        let method = params.0.method;
        self.run(move |session, _, _| ops::op_select_method(session, &method))
            .await
    }

    #[tool(
        name = "session",
        description = "Show the selected input method, which method produced the loaded text, and whether that text is currently visible."
    )]
    async fn session(&self, _params: Parameters<EmptyParams>) -> Result<CallToolResult, McpError> {
        self.run(|session, _, _| Ok(ops::op_session(session))).await
    }

    // ── loading ─────────────────────────────────────────────────────────

    #[tool(
        name = "load_title",
        description = "Search the Project Gutenberg catalog for a novel title and load the plain text of the first result. Returns status loaded, not_found or failed."
    )]
    async fn load_title(&self, params: Parameters<TitleParams>) -> Result<CallToolResult, McpError> {
        self.load(InputSource::ByTitle {
            title: params.0.title,
        })
        .await
    }

    #[tool(
        name = "load_url",
        description = "Fetch a URL and load its body as text. Returns status loaded, empty or failed."
    )]
    async fn load_url(&self, params: Parameters<UrlParams>) -> Result<CallToolResult, McpError> {
        self.load(InputSource::ByUrl { url: params.0.url }).await
    }

    #[tool(
        name = "load_pdf",
        description = "Extract the text of every page of a PDF file (in page order) and load it. Malformed documents return status failed."
    )]
    async fn load_pdf(&self, params: Parameters<PdfParams>) -> Result<CallToolResult, McpError> {
        let path = params.0.path;
        self.run(move |session, fetcher, config| match fs::read(&path) {
            Ok(bytes) => Ok(ops::op_load(
                session,
                InputSource::ByUpload { bytes },
                fetcher,
                config,
            )),
            Err(e) => serde_json::to_value(LoadOutcome::Failed {
                message: format!("{path}: {e}"),
            })
            .map_err(|e| e.to_string()),
        })
        .await
    }

    #[tool(
        name = "load_text",
        description = "Load pasted text into the session."
    )]
    async fn load_text(&self, params: Parameters<TextParams>) -> Result<CallToolResult, McpError> {
        self.load(InputSource::ByPaste {
            text: params.0.text,
        })
        .await
    }

    // ── analysis ────────────────────────────────────────────────────────

    #[tool(
        name = "analyze",
        description = "Analyze the loaded text: total and unique word counts, the ranked frequency table, top-15 bar chart data, word cloud weights, keywords, and the requested table page (20 rows per page). Returns status no_text or no_valid_words when there is nothing to analyze."
    )]
    async fn analyze(&self, params: Parameters<PageParams>) -> Result<CallToolResult, McpError> {
        let page = params.0.page;
        self.run(move |session, _, config| Ok(ops::op_analyze(session, config, page)))
            .await
    }

    #[tool(
        name = "table_page",
        description = "Return one page (1-based, 20 rows) of the ranked word table: Rank, Word, Frequency, % of Text. Pages past the end are empty."
    )]
    async fn table_page(&self, params: Parameters<PageParams>) -> Result<CallToolResult, McpError> {
        let page = params.0.page;
        self.run(move |session, _, config| ops::op_table_page(session, config, page))
            .await
    }

    #[tool(
        name = "keywords",
        description = "Extract the most relevant keywords with scores in (0, 1], best first. Uses the given text, or the session's current text when omitted."
    )]
    async fn keywords(&self, params: Parameters<KeywordsParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        self.run(move |session, _, config| {
            let top_n = p.top_n.unwrap_or(config.analysis.keywords);
            let text = match &p.text {
                Some(text) => text.as_str(),
                None => session
                    .text()
                    .ok_or("No text loaded for the selected input method")?,
            };
            Ok(ops::op_keywords(text, config, top_n))
        })
        .await
    }

    #[tool(
        name = "export_csv",
        description = "Export the ranked word table as CSV (Rank, Word, Frequency, % of Text). Returns the CSV, a base64 data URI, and an HTML download link named word_list.csv."
    )]
    async fn export_csv(&self, _params: Parameters<EmptyParams>) -> Result<CallToolResult, McpError> {
        self.run(|session, _, config| ops::op_export_csv(session, config))
            .await
    }

    // ── utilities ───────────────────────────────────────────────────────

    #[tool(
        name = "resolve_title",
        description = "Look up a novel title in the Project Gutenberg catalog and return the plain-text download URL of the first result, without loading it."
    )]
    async fn resolve_title(&self, params: Parameters<TitleParams>) -> Result<CallToolResult, McpError> {
        let title = params.0.title;
        self.run(move |_, fetcher, config| ops::op_resolve_title(fetcher, config, &title))
            .await
    }

    #[tool(
        name = "normalize_url",
        description = "Show how a URL is parsed for fetching and which cache key it maps to (scheme, www., default port, fragment and tracking parameters removed)."
    )]
    async fn normalize_url(
        &self,
        params: Parameters<NormalizeUrlParams>,
    ) -> Result<CallToolResult, McpError> {
        let url = params.0.url;
        self.run(move |_, _, _| ops::op_normalize_url(&url)).await
    }
}

impl ServerHandler for WordFreqMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Word frequency analyzer. Load text with load_title, load_url, load_pdf or \
                 load_text, then call analyze, table_page, keywords or export_csv. \
                 select_method switches the active input; session shows the current state."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "wordfreq".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Word Frequency Analyzer".into()),
                description: Some(
                    "Word frequencies, keywords, and CSV export for novels, PDFs, pasted text, and web pages"
                        .into(),
                ),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio(config: AnalyzerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // the blocking HTTP client must be built off the async worker threads
    let server = tokio::task::spawn_blocking(move || WordFreqMcp::new(config)).await??;
    info!("MCP server ready on stdio");
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        eprintln!("MCP serve error: {e}");
    })?;
    service.waiting().await?;
    Ok(())
}
