use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{api_message, ApiErrorKind, LetzError, RequestFailure, Result};
use crate::report::{ProgressTracker, Reporter};
use crate::tensor::ImageBatch;
use crate::types::{GenerationRequest, JobHandle, JobStatus, StatusSnapshot};

/// Async client for the LetzAI image API.
///
/// Covers the whole job lifecycle: submit a [`GenerationRequest`], poll
/// until the job is terminal while reporting progress, interrupt it on
/// cancellation, and download the result as an [`ImageBatch`].
///
/// # Example
/// ```no_run
/// use letzai_rs::{GenerationRequest, LetzClient, TracingReporter};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> letzai_rs::Result<()> {
/// let client = LetzClient::new("my-api-key");
/// let batch = client
///     .generate(
///         &GenerationRequest::new("a fox in the snow"),
///         &CancellationToken::new(),
///         &TracingReporter::new(),
///     )
///     .await?;
/// println!("{:?}", batch.shape());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LetzClient {
    http: Client,
    api_key: SecretString,
    config: ClientConfig,
}

impl LetzClient {
    /// Create a client for the public API with default timings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, ClientConfig::default())
    }

    /// Create a client with explicit endpoint and timings.
    pub fn with_config(api_key: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: SecretString::from(api_key.into()),
            config,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.api_key.expose_secret())
    }

    fn require_key(&self) -> Result<()> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(LetzError::InvalidInput("API key is required".into()));
        }
        Ok(())
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Submit a generation job. Returns the handle to poll.
    ///
    /// Validates the request and API key before touching the network.
    /// Accepts both 200 and 201 as success. Failures are reported through
    /// `reporter.error` before being returned.
    pub async fn submit(
        &self,
        request: &GenerationRequest,
        reporter: &dyn Reporter,
    ) -> Result<JobHandle> {
        let result = self.submit_job(request, reporter).await;
        if let Err(ref err) = result {
            reporter.error(&err.to_string());
        }
        result
    }

    async fn submit_job(
        &self,
        request: &GenerationRequest,
        reporter: &dyn Reporter,
    ) -> Result<JobHandle> {
        self.require_key()?;
        request.validate()?;

        reporter.status("Sending generation request...");
        match self.submit_inner(request).await {
            Ok(handle) => {
                tracing::info!(job_id = %handle, "generation job submitted");
                reporter.status(&format!("Generation request accepted (id: {})", handle));
                Ok(handle)
            }
            Err(failure) => {
                tracing::error!(error = %failure, "generation submission failed");
                Err(LetzError::SubmissionFailed(failure))
            }
        }
    }

    async fn submit_inner(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<JobHandle, RequestFailure> {
        let url = format!("{}/images", self.config.base_url);
        tracing::debug!(
            url = %url,
            width = request.width,
            height = request.height,
            mode = request.mode.as_str(),
            "submitting generation request"
        );

        let resp = self
            .authorized(self.http.post(&url))
            .timeout(self.config.request_timeout)
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| RequestFailure::Network {
                context: format!("cannot reach LetzAI at {}", self.config.base_url),
                source: e,
            })?;

        let status = resp.status().as_u16();
        if status != 200 && status != 201 {
            return Err(api_failure(resp, ApiErrorKind::for_submission(status)).await);
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| RequestFailure::MalformedResponse(format!("submission body is not JSON: {}", e)))?;

        job_id(&json)
            .ok_or_else(|| RequestFailure::MalformedResponse("No image ID returned from API".into()))
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Fetch the current status of a job once.
    pub async fn status(&self, handle: &JobHandle) -> Result<StatusSnapshot> {
        self.status_inner(handle)
            .await
            .map_err(LetzError::PollingFailed)
    }

    async fn status_inner(
        &self,
        handle: &JobHandle,
    ) -> std::result::Result<StatusSnapshot, RequestFailure> {
        let url = format!("{}/images/{}", self.config.base_url, handle);
        let resp = self
            .authorized(self.http.get(&url))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| RequestFailure::Network {
                context: format!("status check for job {}", handle),
                source: e,
            })?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(api_failure(resp, ApiErrorKind::for_status_check(status)).await);
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| RequestFailure::MalformedResponse(format!("status body is not JSON: {}", e)))?;
        Ok(StatusSnapshot::from_json(&json))
    }

    // ── Control ─────────────────────────────────────────────────────

    /// Ask LetzAI to stop a running job via `PUT /images/{id}/interruption`.
    pub async fn interrupt(&self, handle: &JobHandle) -> Result<()> {
        let url = format!("{}/images/{}/interruption", self.config.base_url, handle);
        let resp = self
            .authorized(self.http.put(&url))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                LetzError::PollingFailed(RequestFailure::Network {
                    context: format!("interruption of job {}", handle),
                    source: e,
                })
            })?;

        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let failure = api_failure(resp, ApiErrorKind::for_status_check(code)).await;
            return Err(LetzError::PollingFailed(failure));
        }
        Ok(())
    }

    // ── Completion waiting ──────────────────────────────────────────

    /// Poll until the job is ready, fails, times out or is cancelled.
    /// Returns the URL of the original-resolution image.
    ///
    /// `cancel` is checked before every status query. When it fires, a
    /// best-effort interruption is sent and [`LetzError::Cancelled`] is
    /// returned whatever the interruption call's outcome. Timing out
    /// does not interrupt the remote job.
    pub async fn poll_until_done(
        &self,
        handle: &JobHandle,
        max_wait: Duration,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<String> {
        let result = self.poll_loop(handle, max_wait, cancel, reporter).await;
        if let Err(ref err) = result {
            reporter.error(&err.to_string());
        }
        result
    }

    async fn poll_loop(
        &self,
        handle: &JobHandle,
        max_wait: Duration,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<String> {
        let result = self.poll_steps(handle, max_wait, cancel, reporter).await;
        if let Err(ref err) = result {
            tracing::error!(job_id = %handle, error = %err, "generation did not complete");
        }
        result
    }

    async fn poll_steps(
        &self,
        handle: &JobHandle,
        max_wait: Duration,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<String> {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new();
        reporter.start_job();

        loop {
            if cancel.is_cancelled() {
                self.interrupt_best_effort(handle, reporter).await;
                return Err(LetzError::Cancelled);
            }
            if start.elapsed() > max_wait {
                return Err(LetzError::Timeout(max_wait));
            }

            let snap = self
                .status_inner(handle)
                .await
                .map_err(LetzError::PollingFailed)?;

            tracing::debug!(
                job_id = %handle,
                status = %snap.raw_status,
                progress = snap.progress,
                "polled job status"
            );

            let progress = if snap.status == JobStatus::Ready { 100 } else { snap.progress };
            tracker.report(progress, reporter);
            reporter.status(&format!("Status: {}, Progress: {}%", snap.raw_status, progress));

            match snap.status {
                JobStatus::Queued | JobStatus::Running => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                JobStatus::Ready => {
                    return snap.image_url.ok_or_else(|| {
                        LetzError::PollingFailed(RequestFailure::MalformedResponse(
                            "No image URL found in completed generation".into(),
                        ))
                    });
                }
                JobStatus::Failed => {
                    return Err(LetzError::GenerationFailed(
                        snap.message.unwrap_or_else(|| "Generation failed".into()),
                    ));
                }
                JobStatus::Unknown(raw) => return Err(LetzError::UnrecognizedStatus(raw)),
            }
        }
    }

    async fn interrupt_best_effort(&self, handle: &JobHandle, reporter: &dyn Reporter) {
        reporter.status("Cancelling generation...");
        match self.interrupt(handle).await {
            Ok(()) => {
                tracing::info!(job_id = %handle, "remote job interrupted");
            }
            Err(e) => {
                tracing::warn!(job_id = %handle, error = %e, "failed to interrupt remote job");
                reporter.status(&format!("Warning: could not interrupt job {}: {}", handle, e));
            }
        }
    }

    // ── Image download ──────────────────────────────────────────────

    /// Download a finished image and decode it into a single-image batch.
    pub async fn download_image(&self, url: &str) -> Result<ImageBatch> {
        let resp = self
            .http
            .get(url)
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(|e| LetzError::DownloadFailed(format!("request to {} failed: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(LetzError::DownloadFailed(format!(
                "HTTP {} fetching {}",
                resp.status().as_u16(),
                url
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LetzError::DownloadFailed(format!("failed to read image bytes: {}", e)))?;
        ImageBatch::decode(&bytes)
    }

    // ── Full flow ───────────────────────────────────────────────────

    /// Submit, wait with the configured `max_wait`, and download.
    ///
    /// Any failure is reported once through `reporter.error` as
    /// `"LetzAI generation failed: ..."` before being returned.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<ImageBatch> {
        match self.generate_inner(request, cancel, reporter).await {
            Ok(batch) => {
                reporter.status("Image generation completed!");
                Ok(batch)
            }
            Err(err) => {
                reporter.error(&format!("LetzAI generation failed: {}", err));
                Err(err)
            }
        }
    }

    async fn generate_inner(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<ImageBatch> {
        let handle = self.submit_job(request, reporter).await?;
        let url = self
            .poll_loop(&handle, self.config.max_wait, cancel, reporter)
            .await?;
        tracing::info!(job_id = %handle, "generation ready, downloading image");
        self.download_image(&url).await
    }
}

/// Job id from a submission body. LetzAI sends a string, numeric ids
/// are stringified.
fn job_id(json: &Value) -> Option<JobHandle> {
    match json.get("id")? {
        Value::String(s) if !s.is_empty() => Some(JobHandle::new(s.as_str())),
        Value::Number(n) => Some(JobHandle::new(n.to_string())),
        _ => None,
    }
}

/// Turn a non-success response into a classified failure, reading the body
/// for the API's message.
async fn api_failure(resp: Response, kind: ApiErrorKind) -> RequestFailure {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let mut message = api_message(&body);
    if message.is_empty() {
        message = format!("API request failed with status {}", status);
    }
    RequestFailure::Api {
        kind,
        status,
        message,
    }
}
