//! End-to-end test support for Janitor
//!
//! - [`harness`]: isolated on-disk workspaces holding a dataset and its artifacts
//! - [`mocks`]: fixture questions and embedding providers with scripted behavior

pub mod harness;
pub mod mocks;

pub use harness::TestWorkspace;
pub use mocks::{FailingProvider, TestDataFactory, FIXTURE_DIMENSIONS};
