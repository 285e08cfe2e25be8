//! Publication data model: targets, managed-file mappings, and prune
//! outcomes.

use serde::{Deserialize, Serialize};

/// One publish destination: a repository, the branch updates merge
/// into, and the per-target publish flags. Immutable per publish run;
/// a vault may configure many (one per mirror).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
    /// Branch working branches are derived from and merged into.
    pub base_branch: String,
    /// Commit-message template for squash merges; blank selects the
    /// default `[PUBLISHER] Merge #<n>` title.
    #[serde(default)]
    pub commit_msg: String,
    /// Merge the pull request automatically after creation.
    #[serde(default)]
    pub auto_merge: bool,
    /// Allow pruning of orphaned remote files for this target.
    #[serde(default)]
    pub auto_clean: bool,
}

impl RepoTarget {
    /// `owner/repo` display form used in notices and logs.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The remote path a locally shared document or attachment currently
/// resolves to, for one target. The set of these is the authoritative
/// "what should exist remotely".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFileRef {
    pub remote_path: String,
    pub target: RepoTarget,
}

/// One target paired with the full managed-file set of the publication,
/// so the reconciler can look up which refs belong to the target and
/// which belong elsewhere.
#[derive(Debug, Clone)]
pub struct MonoRepoContext {
    pub target: RepoTarget,
    pub shared: Vec<ManagedFileRef>,
}

impl MonoRepoContext {
    pub fn new(target: RepoTarget, shared: Vec<ManagedFileRef>) -> Self {
        Self { target, shared }
    }

    /// `true` when `path` is currently mapped to this context's target.
    pub fn is_mapped_here(&self, path: &str) -> bool {
        self.shared
            .iter()
            .any(|m| m.remote_path == path && m.target == self.target)
    }

    /// `true` when `path` is currently mapped to any target.
    pub fn is_mapped_anywhere(&self, path: &str) -> bool {
        self.shared.iter().any(|m| m.remote_path == path)
    }
}

/// Aggregate result of one (branch, target) prune invocation. Both
/// lists preserve the remote listing's iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub deleted: Vec<String>,
    pub undeleted: Vec<String>,
    pub success: bool,
}

impl DeletionOutcome {
    /// Empty, successful outcome: nothing needed deleting or pruning
    /// was disabled for the target.
    pub fn noop() -> Self {
        Self {
            deleted: Vec::new(),
            undeleted: Vec::new(),
            success: true,
        }
    }

    /// Empty, unsuccessful outcome: the prune was aborted before any
    /// deletion was attempted.
    pub fn aborted() -> Self {
        Self {
            deleted: Vec::new(),
            undeleted: Vec::new(),
            success: false,
        }
    }
}
