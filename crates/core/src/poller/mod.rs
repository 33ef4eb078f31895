//! Job status polling.
//!
//! `JobPoller` is the seam between the orchestrator and the way terminal job
//! states are discovered. `IntervalPoller` checks status at a fixed interval
//! until the job completes, fails, or the deadline passes.

mod interval;
mod traits;
mod types;

pub use interval::IntervalPoller;
pub use traits::*;
pub use types::*;
