//! Remote Git-hosting API layer.
//!
//! Provides:
//! - [`RemoteClient`] — the named REST operations the orchestration
//!   logic consumes
//! - [`GithubRest`] — GitHub v3 REST implementation over `reqwest`
//! - [`fakes::MemoryRemote`] — in-memory implementation for tests

pub mod client;
pub mod error;
pub mod fakes;
pub mod github;

pub use client::{BranchInfo, PullRequestInfo, RemoteClient, RemoteContent, RemoteFileEntry};
pub use error::{RemoteError, RemoteResult};
pub use github::GithubRest;
