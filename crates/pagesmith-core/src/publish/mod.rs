//! Publication orchestration.
//!
//! Provides:
//! - [`validator::RepoValidator`] — pre-flight target validation
//! - [`branch::BranchLifecycleManager`] — working-branch derivation
//! - [`pull_request::PullRequestCoordinator`] — PR open/merge/cleanup
//!   and multi-repo aggregation
//! - [`reconcile::FileReconciler`] — remote orphan pruning
//! - [`index_guard::IndexFileGuard`] — front-matter deletion veto
//!
//! Every public operation accepts an explicit sequence of
//! [`model::RepoTarget`] and an explicit configuration value; there is
//! no ambient global state.

pub mod branch;
pub mod index_guard;
pub mod model;
pub mod pull_request;
pub mod reconcile;
pub mod validator;

pub use branch::{BranchLifecycleManager, BranchOutcome};
pub use index_guard::IndexFileGuard;
pub use model::{DeletionOutcome, ManagedFileRef, MonoRepoContext, RepoTarget};
pub use pull_request::{PullRequestCoordinator, NO_PULL_REQUEST};
pub use reconcile::{filter_remote_files, FileReconciler};
pub use validator::{RepoValidator, ValidationIssue, ValidationReport};
