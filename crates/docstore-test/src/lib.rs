//! # docstore-test
//!
//! End-to-end tests for DocStore.
//!
//! This crate contains:
//! - Fixtures for in-memory and file-backed connections
//! - A call-recording engine wrapper for asserting on engine traffic
//! - The integration suites under `tests/`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Connection fixtures and sample data.
pub mod utils;

/// Engine wrapper that records every call.
pub mod recording;

pub use recording::{Call, CallLog, RecordingEngine};
pub use utils::{
    decimal, init_test_logging, memory_connection, recorded_connection, sample_record,
    TempDatabase,
};
