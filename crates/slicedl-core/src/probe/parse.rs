//! Parse status lines and `Content-Range` values from response headers.

/// Status code from a status line such as `HTTP/1.1 206 Partial Content` or `HTTP/2 200`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let line = line.trim();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Strips the `bytes ` unit from a `Content-Range` value.
fn content_range_spec(value: &str) -> Option<&str> {
    let value = value.trim();
    value
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes "))
        .map(|_| &value[6..])
}

/// Total size from a `Content-Range` value: `bytes 0-99/1000` -> 1000.
/// Returns `None` for an unknown (`*`) or malformed total.
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = content_range_spec(value)?.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// First byte of a `Content-Range` value: `bytes 100-199/1000` -> 100.
/// Returns `None` for `bytes */1000` or a malformed value.
pub(crate) fn parse_content_range_start(value: &str) -> Option<u64> {
    let (range, _) = content_range_spec(value)?.split_once('/')?;
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}

/// Headers of the final response; earlier (redirect) responses are discarded.
#[derive(Debug, Default)]
pub(crate) struct ResponseHeaders {
    pub status: Option<u32>,
    pub content_range: Option<String>,
    pub accept_ranges: bool,
}

impl ResponseHeaders {
    /// Feed one raw header line as delivered by curl.
    pub(crate) fn push_line(&mut self, line: &str) {
        if let Some(code) = parse_status_line(line) {
            *self = ResponseHeaders {
                status: Some(code),
                ..Default::default()
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-range") {
                self.content_range = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                self.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines() {
        assert_eq!(parse_status_line("HTTP/1.1 206 Partial Content\r\n"), Some(206));
        assert_eq!(parse_status_line("HTTP/2 200"), Some(200));
        assert_eq!(parse_status_line("Content-Length: 5"), None);
        assert_eq!(parse_status_line("HTTP/1.1"), None);
    }

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-99/1000"), Some(1000));
        assert_eq!(parse_content_range_total("Bytes 0-0/1"), Some(1));
        assert_eq!(parse_content_range_total("bytes */5000"), Some(5000));
        assert_eq!(parse_content_range_total("bytes 0-99/*"), None);
        assert_eq!(parse_content_range_total("items 0-9/10"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn content_range_start() {
        assert_eq!(parse_content_range_start("bytes 100-199/1000"), Some(100));
        assert_eq!(parse_content_range_start("bytes 0-0/1"), Some(0));
        assert_eq!(parse_content_range_start("bytes */1000"), None);
        assert_eq!(parse_content_range_start("bytes 5/10"), None);
        assert_eq!(parse_content_range_start("items 1-2/3"), None);
    }

    #[test]
    fn redirect_headers_discarded() {
        let mut h = ResponseHeaders::default();
        for line in [
            "HTTP/1.1 302 Found",
            "Location: /file",
            "Content-Range: bytes 0-0/1",
            "",
            "HTTP/1.1 206 Partial Content",
            "Accept-Ranges: bytes",
            "Content-Range: bytes 0-4095/4096",
        ] {
            h.push_line(line);
        }
        assert_eq!(h.status, Some(206));
        assert!(h.accept_ranges);
        assert_eq!(h.content_range.as_deref(), Some("bytes 0-4095/4096"));
    }

    #[test]
    fn missing_content_range() {
        let mut h = ResponseHeaders::default();
        h.push_line("HTTP/1.1 200 OK");
        h.push_line("Content-Length: 10");
        assert_eq!(h.status, Some(200));
        assert!(h.content_range.is_none());
        assert!(!h.accept_ranges);
    }
}
