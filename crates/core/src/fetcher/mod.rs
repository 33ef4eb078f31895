//! Streaming artifact download.
//!
//! Artifacts are streamed chunk by chunk into `<destination>.part` and only
//! renamed onto `destination` once every byte has been written and synced.
//! A file at `destination` is therefore always complete.

mod streaming;
mod traits;
mod types;

pub use streaming::StreamingFetcher;
pub use traits::*;
pub use types::*;
