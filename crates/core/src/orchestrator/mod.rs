//! End-to-end job runner.
//!
//! The orchestrator sequences one job strictly in order and stops at the
//! first failure:
//! - **Health**: unsigned probe of the service
//! - **Submit**: signed `POST /generate-video`
//! - **Poll**: wait for a terminal job state (via a `JobPoller`)
//! - **Fetch**: stream the artifact to disk (via an `ArtifactFetcher`)

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{NoopRunObserver, Orchestrator, RunObserver};
pub use types::{ErrorKind, OrchestratorError, RunReport};
