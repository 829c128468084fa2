use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{LetzError, Result};

/// Smallest width or height LetzAI accepts.
pub const MIN_DIMENSION: u32 = 520;
/// Largest width or height LetzAI accepts.
pub const MAX_DIMENSION: u32 = 2160;
/// Quality and creativity levels run from 1 to this value.
pub const MAX_LEVEL: u8 = 5;

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Default,
    Sigma,
    Turbo,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Default, Mode::Sigma, Mode::Turbo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Sigma => "sigma",
            Mode::Turbo => "turbo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

/// LetzAI model generation. Sent on the wire as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemVersion {
    V2,
    #[default]
    V3,
}

impl SystemVersion {
    pub const ALL: [SystemVersion; 2] = [SystemVersion::V2, SystemVersion::V3];

    pub fn number(&self) -> u8 {
        match self {
            SystemVersion::V2 => 2,
            SystemVersion::V3 => 3,
        }
    }

    pub fn from_number(n: u64) -> Option<Self> {
        match n {
            2 => Some(SystemVersion::V2),
            3 => Some(SystemVersion::V3),
            _ => None,
        }
    }
}

impl Serialize for SystemVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// Parameters for one text-to-image generation.
///
/// # Example
/// ```
/// use letzai_rs::{GenerationRequest, Mode};
///
/// let request = GenerationRequest::new("a lighthouse at dusk")
///     .size(1024, 768)
///     .quality(4)
///     .mode(Mode::Turbo)
///     .seed(42);
///
/// assert!(request.validate().is_ok());
/// assert_eq!(request.effective_prompt(), "a lighthouse at dusk [seed:42]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub creativity: u8,
    pub mode: Mode,
    pub version: SystemVersion,
    pub seed: Option<u64>,
    pub has_watermark: bool,
}

impl GenerationRequest {
    /// Create a request with LetzAI's defaults (1600x1600, quality 2,
    /// creativity 2, default mode, v3, watermark on).
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 1600,
            height: 1600,
            quality: 2,
            creativity: 2,
            mode: Mode::Default,
            version: SystemVersion::V3,
            seed: None,
            has_watermark: true,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn creativity(mut self, creativity: u8) -> Self {
        self.creativity = creativity;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn version(mut self, version: SystemVersion) -> Self {
        self.version = version;
        self
    }

    /// Pin a seed. LetzAI has no seed parameter, so it travels as a
    /// `[seed:N]` marker at the end of the prompt.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn watermark(mut self, on: bool) -> Self {
        self.has_watermark = on;
        self
    }

    /// Check every field against the ranges LetzAI accepts.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(LetzError::InvalidInput("Prompt is required".into()));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(LetzError::InvalidInput(format!(
                    "{} must be between {} and {}, got {}",
                    name, MIN_DIMENSION, MAX_DIMENSION, value
                )));
            }
        }
        for (name, value) in [("quality", self.quality), ("creativity", self.creativity)] {
            if !(1..=MAX_LEVEL).contains(&value) {
                return Err(LetzError::InvalidInput(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_LEVEL, value
                )));
            }
        }
        Ok(())
    }

    /// The prompt as sent to the API, with the seed marker appended.
    pub fn effective_prompt(&self) -> String {
        match self.seed {
            Some(seed) => format!("{} [seed:{}]", self.prompt, seed),
            None => self.prompt.clone(),
        }
    }

    /// Build the `POST /images` body.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "prompt": self.effective_prompt(),
            "width": self.width,
            "height": self.height,
            "quality": self.quality,
            "creativity": self.creativity,
            "mode": self.mode,
            "systemVersion": self.version,
            "hasWatermark": self.has_watermark,
        })
    }
}

/// Identifier LetzAI assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a job as reported by `GET /images/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Ready,
    Failed,
    /// A status string outside the known lifecycle, kept verbatim.
    Unknown(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "new" | "queued" => JobStatus::Queued,
            "in progress" | "generating" | "running" => JobStatus::Running,
            "ready" => JobStatus::Ready,
            "failed" => JobStatus::Failed,
            other => JobStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

/// One parsed status response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Status string exactly as the API sent it.
    pub raw_status: String,
    pub status: JobStatus,
    /// Completion percentage, clamped to 0..=100.
    pub progress: u8,
    /// `progressMessage`, set on failure.
    pub message: Option<String>,
    /// `imageVersions.original`, set once ready.
    pub image_url: Option<String>,
}

impl StatusSnapshot {
    /// Parse a `GET /images/{id}` body. Missing fields fall back to
    /// `"unknown"` status and zero progress.
    pub fn from_json(json: &Value) -> Self {
        let raw_status = json
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let progress = json
            .get("progress")
            .and_then(|v| v.as_f64())
            .map(|p| p.clamp(0.0, 100.0) as u8)
            .unwrap_or(0);
        let message = json
            .get("progressMessage")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);
        let image_url = json
            .pointer("/imageVersions/original")
            .and_then(|v| v.as_str())
            .map(String::from);

        Self {
            status: JobStatus::parse(&raw_status),
            raw_status,
            progress,
            message,
            image_url,
        }
    }
}
