//! Input record schema
//!
//! This module defines the analytics event record the pipeline consumes and
//! the adapter that reads JSON and NDJSON event logs into it.

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
