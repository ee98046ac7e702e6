//! Test harness


pub use workspace::TestWorkspace;
