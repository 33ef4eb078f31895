//! Job service wire types and typed API.

mod api;
mod types;

pub use api::JobApi;
pub use types::*;
