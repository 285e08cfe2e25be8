//! Pagesmith core library.
//!
//! Publishes a curated subset of a document vault to one or more
//! Git-hosted mirror repositories through a review workflow (working
//! branch → pull request → merge → branch cleanup) and keeps each
//! mirror's managed subtree pruned of files the publication no longer
//! maps to it.
//!
//! All remote access goes through the [`remote::RemoteClient`] trait;
//! orchestration components take target lists and configuration as
//! explicit values.

pub mod config;
pub mod frontmatter;
pub mod notify;
pub mod publish;
pub mod remote;
pub mod telemetry;

pub use config::{is_attachment, ExclusionRule, PruneConfig, UploadBehavior};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use publish::{
    BranchLifecycleManager, BranchOutcome, DeletionOutcome, FileReconciler, IndexFileGuard,
    ManagedFileRef, MonoRepoContext, PullRequestCoordinator, RepoTarget, RepoValidator,
    ValidationIssue, ValidationReport, NO_PULL_REQUEST,
};
pub use remote::{
    BranchInfo, GithubRest, PullRequestInfo, RemoteClient, RemoteContent, RemoteError,
    RemoteFileEntry, RemoteResult,
};
pub use telemetry::init_tracing;

/// Pagesmith version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
