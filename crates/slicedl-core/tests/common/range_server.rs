//! Minimal HTTP/1.1 server that supports Range GET for integration tests.
//!
//! Serves a single static body. Responds to GET with Range with 206 Partial
//! Content and a `Content-Range` total. Faults can be injected per range start:
//! a forced status, a body cut short after N bytes, or a 200 that ignores Range.
//! Every request's range is recorded so tests can count dispatches.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum FaultKind {
    /// Respond with this status and an empty body.
    Status(u16),
    /// Send full headers but only this many body bytes, then close.
    Truncate(usize),
    /// Answer `200 OK` with the whole body, as if Range were not supported.
    IgnoreRange,
}

/// Applied to the first `times` requests whose range starts at `start`
/// and has an explicit end (the probe's open-ended `0-` is never faulted).
#[derive(Debug, Clone, Copy)]
pub struct Fault {
    pub start: u64,
    pub times: usize,
    pub kind: FaultKind,
}

#[derive(Debug, Clone)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and returns 200 with the full body and no Content-Range.
    pub support_ranges: bool,
    pub faults: Vec<Fault>,
    /// Send bodies in chunks of this size with a pause between them.
    pub slow_chunks: Option<(usize, Duration)>,
    /// Requests to this path get `302 Found` pointing at `/`.
    pub redirect_from: Option<&'static str>,
    /// Total announced in the probe's `Content-Range` instead of the body length.
    pub advertised_total: Option<u64>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            faults: Vec::new(),
            slow_chunks: None,
            redirect_from: None,
            advertised_total: None,
        }
    }
}

/// Handle to a running server.
pub struct RangeServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/".
    pub url: String,
    requests: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl RangeServer {
    /// Number of ranged requests seen whose range started at `start` (excluding the probe).
    pub fn requests_starting_at(&self, start: u64) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, e)| *s == start && *e != u64::MAX)
            .count()
    }
}

/// Starts a server in a background thread serving `body`. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (faults, slow body, no ranges).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let faults = Arc::new(Mutex::new(opts.faults.clone()));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let opts = Arc::new(opts);
    {
        let requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let body = Arc::clone(&body);
                let faults = Arc::clone(&faults);
                let requests = Arc::clone(&requests);
                let opts = Arc::clone(&opts);
                thread::spawn(move || handle(stream, &body, &opts, &faults, &requests));
            }
        });
    }
    RangeServer {
        url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: &RangeServerOptions,
    faults: &Mutex<Vec<Fault>>,
    requests: &Mutex<Vec<(u64, u64)>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, range) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    if opts.redirect_from == Some(path) {
        let _ = stream.write_all(
            b"HTTP/1.1 302 Found\r\nLocation: /\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let total = body.len() as u64;
    if !opts.support_ranges || range.is_none() {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(head.as_bytes());
        send_body(&mut stream, body, opts.slow_chunks);
        return;
    }

    let (start, end_incl) = range.unwrap_or((0, u64::MAX));
    requests.lock().unwrap().push((start, end_incl));

    let mut fault = None;
    if end_incl != u64::MAX {
        let mut faults = faults.lock().unwrap();
        if let Some(f) = faults.iter_mut().find(|f| f.start == start && f.times > 0) {
            f.times -= 1;
            fault = Some(f.kind);
        }
    }
    if let Some(FaultKind::IgnoreRange) = fault {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(head.as_bytes());
        send_body(&mut stream, body, opts.slow_chunks);
        return;
    }
    if let Some(FaultKind::Status(code)) = fault {
        let head = format!(
            "HTTP/1.1 {} Injected\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            code
        );
        let _ = stream.write_all(head.as_bytes());
        return;
    }

    let announced = match opts.advertised_total {
        Some(t) if end_incl == u64::MAX => t,
        _ => total,
    };
    let end_incl = end_incl.min(total.saturating_sub(1));
    if start > end_incl {
        let head = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(head.as_bytes());
        return;
    }
    let slice = &body[start as usize..=end_incl as usize];
    let head = format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
        slice.len(),
        start,
        end_incl,
        announced
    );
    let _ = stream.write_all(head.as_bytes());
    match fault {
        Some(FaultKind::Truncate(n)) => {
            let _ = stream.write_all(&slice[..n.min(slice.len())]);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        _ => send_body(&mut stream, slice, opts.slow_chunks),
    }
}

fn send_body(stream: &mut TcpStream, data: &[u8], slow_chunks: Option<(usize, Duration)>) {
    match slow_chunks {
        Some((size, pause)) => {
            for (i, chunk) in data.chunks(size.max(1)).enumerate() {
                if i > 0 {
                    thread::sleep(pause);
                }
                if stream.write_all(chunk).is_err() {
                    return;
                }
                let _ = stream.flush();
            }
        }
        None => {
            let _ = stream.write_all(data);
        }
    }
}

/// Returns (method, path, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, &str, Option<(u64, u64)>) {
    let mut method = "";
    let mut path = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if value.to_lowercase().starts_with("bytes=") {
                    let part = value[6..].trim();
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, path, range)
}
