//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths with 200; everything else is 404. Paths listed
//! in `delays` are answered only after sleeping, to keep a request in flight.
//! Every request is counted per path.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct Site {
    files: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `path` (leading slash optional).
    pub fn file(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(normalize(path), body.into());
        self
    }

    /// Delay responses for `path`.
    pub fn delay(mut self, path: &str, by: Duration) -> Self {
        self.delays.insert(normalize(path), by);
        self
    }
}

/// Handle to a running server.
pub struct Server {
    pub base_url: String,
    hits: Hits,
}

type Hits = Arc<Mutex<HashMap<String, usize>>>;

impl Server {
    /// Number of requests received for `path` so far.
    pub fn hits(&self, path: &str) -> usize {
        let hits = self.hits.lock().unwrap();
        hits.get(&normalize(path)).copied().unwrap_or(0)
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(site: Site) -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let site = Arc::new(site);
    let hits: Hits = Arc::default();
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let site = Arc::clone(&site);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &site, &counter));
        }
    });
    Server {
        base_url: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, site: &Site, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    *hits.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    if let Some(delay) = site.delays.get(path) {
        thread::sleep(*delay);
    }
    match site.files.get(path) {
        Some(body) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}
