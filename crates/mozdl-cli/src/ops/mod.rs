//! Fetch operations: the pipeline, its shared context and its errors.

pub mod context;
pub mod error;
pub mod flow;

pub use context::Context;
pub use error::FetchError;
pub use flow::{FetchOutcome, run};
