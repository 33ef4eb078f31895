pub mod config;
pub mod fetcher;
pub mod job;
pub mod orchestrator;
pub mod poller;
pub mod signer;
pub mod testing;
pub mod transport;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use fetcher::{
    ArtifactFetcher, DownloadObserver, DownloadProgress, FetchError, FetcherConfig,
    StreamingFetcher,
};
pub use job::{
    GenerateVideoRequest, HealthReport, JobApi, JobSnapshot, JobStatus, SubmitResponse,
};
pub use orchestrator::{
    ErrorKind, NoopRunObserver, Orchestrator, OrchestratorConfig, OrchestratorError, RunObserver,
    RunReport,
};
pub use poller::{
    IntervalPoller, JobPoller, NoopObserver, PollError, PollerConfig, ProgressObservation,
    ProgressObserver,
};
pub use signer::{canonical_body, Signer, SignerError};
pub use transport::{
    HttpTransport, Method, NetworkCause, Transport, TransportConfig, TransportError,
    TransportResponse,
};
