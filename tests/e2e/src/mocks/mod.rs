//! Test doubles and fixture data

mod fixtures;
mod providers;

pub use fixtures::{TestDataFactory, FIXTURE_DIMENSIONS};
pub use providers::FailingProvider;
