//! Scripted in-process transport for scheduler and runner tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::job::{Payload, SubmitParams};
use crate::transport::{ArtifactFetcher, FetchError, JobTransport, RawResponse, TransportError};

#[derive(Debug, Clone)]
enum Outcome {
    Ok { original: u64, output: u64 },
    Status { code: u32, body: String },
    TransportError,
    Panic,
}

/// What the fake server does for one file name.
#[derive(Debug, Clone)]
pub struct Script {
    delay: Duration,
    /// `(sent, total)` pairs reported before the response.
    steps: Vec<(u64, u64)>,
    outcome: Outcome,
}

impl Script {
    fn new(outcome: Outcome) -> Self {
        Self {
            delay: Duration::ZERO,
            steps: vec![(0, 100), (50, 100), (100, 100)],
            outcome,
        }
    }

    pub fn ok(original: u64, output: u64) -> Self {
        Self::new(Outcome::Ok { original, output })
    }

    pub fn status(code: u32, body: &str) -> Self {
        Self::new(Outcome::Status {
            code,
            body: body.to_string(),
        })
    }

    /// Connection drops after `sent` of 100 bytes.
    pub fn transport_error(sent: u64) -> Self {
        Self {
            steps: vec![(0, 100), (sent, 100)],
            ..Self::new(Outcome::TransportError)
        }
    }

    pub fn panic() -> Self {
        Self {
            steps: Vec::new(),
            ..Self::new(Outcome::Panic)
        }
    }

    pub fn delay(mut self, d: Duration) -> Self {
        self.delay = d;
        self
    }
}

/// One recorded `submit` call.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub quality: String,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
pub struct FakeTransport {
    scripts: HashMap<String, Script>,
    missing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    /// Make `fetch` answer 404 for this locator.
    pub fn missing_artifact(mut self, locator: &str) -> Self {
        self.missing.insert(locator.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Locator the fake hands out for a source file name.
pub fn locator_for(name: &str) -> String {
    format!("/api/file?folder=compressions&filename={name}")
}

fn success_body(name: &str, original: u64, output: u64) -> String {
    let ratio = if original > 0 && output < original {
        format!("{:.2}%", (original - output) as f64 / original as f64 * 100.0)
    } else {
        "0%".to_string()
    };
    serde_json::json!({
        "success": true,
        "fileUrl": locator_for(name),
        "filename": format!("{:08x}-compressed.pdf", name.len() * 0x9e37),
        "originalName": name,
        "originalSize": original,
        "compressedSize": output,
        "compressionRatio": ratio,
    })
    .to_string()
}

impl JobTransport for FakeTransport {
    fn submit(
        &self,
        payload: &Payload,
        params: &SubmitParams,
        on_upload: &mut dyn FnMut(u64, u64),
    ) -> Result<RawResponse, TransportError> {
        let name = payload.file_name().unwrap_or_default().to_string();
        let script = self
            .scripts
            .get(&name)
            .cloned()
            .unwrap_or_else(|| Script::ok(100, 50));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let started = Instant::now();

        let step_pause = script.delay / (script.steps.len() as u32 + 1);
        for (sent, total) in &script.steps {
            on_upload(*sent, *total);
            std::thread::sleep(step_pause);
        }
        std::thread::sleep(step_pause);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call {
            name: name.clone(),
            quality: params.quality.to_string(),
            started,
            finished: Instant::now(),
        });

        match script.outcome {
            Outcome::Ok { original, output } => Ok(RawResponse {
                status: 200,
                body: success_body(&name, original, output).into_bytes(),
            }),
            Outcome::Status { code, body } => Ok(RawResponse {
                status: code,
                body: body.into_bytes(),
            }),
            Outcome::TransportError => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            Outcome::Panic => panic!("scripted transport panic for {name}"),
        }
    }
}

impl ArtifactFetcher for FakeTransport {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        if self.missing.contains(locator) {
            return Err(FetchError::Http(404));
        }
        Ok(format!("%PDF-1.7 artifact {locator}").into_bytes())
    }
}
