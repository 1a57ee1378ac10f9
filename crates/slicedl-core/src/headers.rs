//! Request header normalization and conversion to curl header lists.

use std::collections::HashMap;

/// Browser-like user agent sent when the caller supplies none.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.102 Safari/537.36";

/// Lowercases header names, adds a default `user-agent` when missing, and
/// drops any caller `range` header (ranges are set per request).
pub fn normalize_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty() && k != "range")
        .collect();
    out.entry("user-agent".to_string())
        .or_insert_with(|| DEFAULT_USER_AGENT.to_string());
    out
}

/// Parses a `Name: value` line (e.g. from the command line).
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Builds a curl header list (`Name: value` per entry).
pub fn curl_header_list(headers: &HashMap<String, String>) -> Result<curl::easy::List, curl::Error> {
    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k, v))?;
    }
    Ok(list)
}
