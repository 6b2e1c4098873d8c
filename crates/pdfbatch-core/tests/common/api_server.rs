//! Minimal HTTP/1.1 stand-in for the compression API.
//!
//! `POST <endpoint>` reads the multipart upload and answers according to the
//! uploaded file name (success by default). `GET /api/file?...&filename=X`
//! serves a small artifact, or 404 for names marked missing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Ok { original: u64, compressed: u64 },
    Status { code: u16, body: String },
    BadJson,
}

/// One upload as seen by the server.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub quality: Option<String>,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct ApiServerOptions {
    pub replies: HashMap<String, Reply>,
    /// Stored names whose artifact GET returns 404.
    pub missing: HashSet<String>,
}

pub struct ApiServer {
    pub base_url: String,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl ApiServer {
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

/// Starts the server on an ephemeral port. Runs until the process exits.
pub fn start(opts: ApiServerOptions) -> ApiServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let opts = Arc::new(opts);
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&uploads);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &opts, &log));
        }
    });
    ApiServer {
        base_url: format!("http://127.0.0.1:{}", port),
        uploads,
    }
}

/// A base URL where nothing is listening.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Name the server stores an upload under: a UUID-shaped id derived from
/// the source name, unrelated to the source file's stem.
pub fn stored_name(source: &str) -> String {
    let h = source
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100_0000_01b3));
    format!(
        "{:08x}-{:04x}-4{:03x}-a{:03x}-{:012x}-compressed.pdf",
        h >> 32,
        (h >> 16) & 0xffff,
        h & 0xfff,
        (h >> 4) & 0xfff,
        h & 0xffff_ffff_ffff
    )
}

pub fn artifact_body(output: &str) -> Vec<u8> {
    format!("%PDF-1.4 compressed {output}").into_bytes()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 16 * 1024];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = header(&head, "content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    Some((head, data[header_end..].to_vec()))
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim()
            .eq_ignore_ascii_case(name)
            .then(|| v.trim().to_string())
    })
}

/// Value following `marker` up to the next CRLF.
fn field_after(body: &[u8], marker: &[u8]) -> Option<String> {
    let start = find(body, marker)? + marker.len();
    let len = find(&body[start..], b"\r\n").unwrap_or(body.len() - start);
    Some(String::from_utf8_lossy(&body[start..start + len]).to_string())
}

fn parse_upload(head: &str, body: &[u8]) -> Upload {
    let filename = field_after(body, b"filename=\"")
        .and_then(|s| s.split('"').next().map(str::to_string))
        .unwrap_or_default();
    let content_type = find(body, b"filename=\"")
        .and_then(|pos| field_after(&body[pos..], b"Content-Type: "));
    Upload {
        filename,
        quality: field_after(body, b"name=\"quality\"\r\n\r\n"),
        api_key: header(head, "x-api-key"),
        content_type,
    }
}

fn respond(stream: &mut TcpStream, status: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn status_line(code: u16) -> String {
    let reason = match code {
        200 => "OK",
        402 => "Payment Required",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    format!("{code} {reason}")
}

fn handle(mut stream: TcpStream, opts: &ApiServerOptions, log: &Mutex<Vec<Upload>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };
    let mut parts = head.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");

    if method.eq_ignore_ascii_case("GET") && target.starts_with("/api/file") {
        let name = target
            .split_once("filename=")
            .map(|(_, n)| n.split('&').next().unwrap_or(""))
            .unwrap_or("");
        if name.is_empty() || opts.missing.contains(name) {
            respond(&mut stream, &status_line(404), br#"{"error":"File not found"}"#);
        } else {
            respond(&mut stream, &status_line(200), &artifact_body(name));
        }
        return;
    }

    if !method.eq_ignore_ascii_case("POST") {
        respond(&mut stream, "405 Method Not Allowed", b"");
        return;
    }

    let upload = parse_upload(&head, &body);
    let reply = opts
        .replies
        .get(&upload.filename)
        .cloned()
        .unwrap_or(Reply::Ok {
            original: 1000,
            compressed: 400,
        });
    let filename = upload.filename.clone();
    log.lock().unwrap().push(upload);

    match reply {
        Reply::Ok {
            original,
            compressed,
        } => {
            let output = stored_name(&filename);
            let ratio = if original > 0 && compressed < original {
                format!("{:.2}%", (original - compressed) as f64 / original as f64 * 100.0)
            } else {
                "0%".to_string()
            };
            let json = format!(
                r#"{{"success":true,"message":"PDF compression successful","fileUrl":"/api/file?folder=compressions&filename={output}","filename":"{output}","originalName":"{filename}","originalSize":{original},"compressedSize":{compressed},"compressionRatio":"{ratio}"}}"#
            );
            respond(&mut stream, &status_line(200), json.as_bytes());
        }
        Reply::Status { code, body } => respond(&mut stream, &status_line(code), body.as_bytes()),
        Reply::BadJson => respond(&mut stream, &status_line(200), b"<html>not json</html>"),
    }
}
