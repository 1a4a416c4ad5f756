//! End-to-end tests for the self-update flow.
//!
//! A wiremock server stands in for the tag listing and the release download
//! endpoint; a throwaway file in a temp directory stands in for the installed
//! executable.
//!
//! Run with: `cargo test --test e2e`

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod upgrade_flow;


pub use harness::{tar_gz, FakeInstall, RecordingPrompter, ReleaseServer};
