//! # letzai-rs
//!
//! Async Rust client for the [LetzAI](https://letz.ai) text-to-image API,
//! shaped for use inside node-based image-generation hosts.
//!
//! Provides job submission with classified HTTP errors, fixed-interval
//! status polling with forward-only progress reporting, cooperative
//! cancellation that interrupts the remote job, and conversion of the
//! finished image into an `[batch, height, width, 3]` float tensor.
//!
//! ## Quick Start
//!
//! ```no_run
//! use letzai_rs::{GenerationRequest, LetzClient, Mode, TracingReporter};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> letzai_rs::Result<()> {
//! let client = LetzClient::new(std::env::var("LETZAI_API_KEY").unwrap_or_default());
//! let reporter = TracingReporter::new();
//! let cancel = CancellationToken::new();
//!
//! let request = GenerationRequest::new("a sunset over mountains")
//!     .size(1600, 1024)
//!     .mode(Mode::Turbo);
//!
//! // Submit, then poll with progress until the image is ready
//! let job = client.submit(&request, &reporter).await?;
//! let url = client
//!     .poll_until_done(&job, Duration::from_secs(300), &cancel, &reporter)
//!     .await?;
//!
//! let image = client.download_image(&url).await?;
//! println!("shape: {:?}", image.shape());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod report;
pub mod selector;
pub mod tensor;
pub mod types;

pub use client::LetzClient;
pub use config::ClientConfig;
pub use error::{ApiErrorKind, LetzError, RequestFailure, Result};
pub use node::{CacheHint, GeneratorNode, NodeRegistry, NodeSchema, SelectorNode};
pub use report::{NoopReporter, ProgressTracker, Reporter, TracingReporter};
pub use selector::select_best;
pub use tensor::ImageBatch;
pub use types::{GenerationRequest, JobHandle, JobStatus, Mode, StatusSnapshot, SystemVersion};
