use image::{Rgb, RgbImage};
use letzai_rs::{ClientConfig, LetzClient, Reporter};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const API_KEY: &str = "test-key";
pub const JOB_ID: &str = "job-1";

/// Client pointed at the mock server with a short poll interval.
pub fn test_client(server: &MockServer) -> LetzClient {
    let config = ClientConfig::builder()
        .with_base_url(server.uri())
        .with_poll_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_secs(5))
        .build();
    LetzClient::with_config(API_KEY, config)
}

/// Records everything the client reports.
#[derive(Default)]
pub struct RecordingReporter {
    pub statuses: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub deltas: Mutex<Vec<u32>>,
}

impl RecordingReporter {
    /// Running totals of the forwarded progress increments.
    pub fn cumulative(&self) -> Vec<u32> {
        self.deltas
            .lock()
            .unwrap()
            .iter()
            .scan(0, |total, d| {
                *total += d;
                Some(*total)
            })
            .collect()
    }

    pub fn saw_status(&self, needle: &str) -> bool {
        self.statuses.lock().unwrap().iter().any(|s| s.contains(needle))
    }

    pub fn saw_error(&self, needle: &str) -> bool {
        self.errors.lock().unwrap().iter().any(|s| s.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn advance(&self, delta: u32) {
        self.deltas.lock().unwrap().push(delta);
    }
}

/// Replays a fixed list of responses, repeating the last one. Optionally
/// trips a cancellation token when serving a given call.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty());
        Self {
            responses,
            calls: AtomicUsize::new(0),
            cancel_at: None,
        }
    }

    /// Cancel `token` while serving the `call`-th request (0-based).
    pub fn cancel_on(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_at = Some((call, token));
        self
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((at, token)) = &self.cancel_at {
            if n == *at {
                token.cancel();
            }
        }
        let idx = n.min(self.responses.len() - 1);
        self.responses[idx].clone()
    }
}

/// `200` status body.
pub fn status_body(status: &str, progress: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": JOB_ID,
        "status": status,
        "progress": progress,
    }))
}

/// `200` ready body pointing at `url`.
pub fn ready_body(url: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": JOB_ID,
        "status": "ready",
        "progress": 95,
        "imageVersions": { "original": url },
    }))
}

/// A small solid-color PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
