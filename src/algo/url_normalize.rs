use url::Url;

use crate::error::{Result, WordFreqError};

/// Parse a user-supplied URL for fetching:
/// - Trim whitespace, reject empty input
/// - Add `https://` if no scheme is given
/// - Only http and https are accepted
/// - Drop the fragment (never sent to the server)
pub fn parse_fetch_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WordFreqError::EmptyInput("url"));
    }

    let with_scheme = if !trimmed.contains("://") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let mut parsed = Url::parse(&with_scheme).map_err(|source| WordFreqError::InvalidUrl {
        input: trimmed.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WordFreqError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Content-addressing key for the fetch cache. Two URLs that serve the same
/// document map to the same key:
/// - Scheme dropped, host lowercased, `www.` stripped
/// - Default ports and fragment removed
/// - Tracking parameters (utm_*, fbclid, ...) removed, the rest sorted
/// - Trailing slashes removed
pub fn cache_key(url: &Url) -> String {
    let mut parsed = url.clone();
    parsed.set_fragment(None);

    if parsed.port() == Some(80) || parsed.port() == Some(443) {
        let _ = parsed.set_port(None);
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        pairs.sort();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mut key = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    key.push_str(parsed.path().trim_end_matches('/'));
    if let Some(query) = parsed.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

fn is_tracking_param(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.starts_with("utm_")
        || matches!(
            lower.as_str(),
            "fbclid" | "gclid" | "dclid" | "msclkid" | "mc_cid" | "mc_eid"
            | "_ga" | "_gl" | "yclid" | "twclid" | "igshid"
        )
}
