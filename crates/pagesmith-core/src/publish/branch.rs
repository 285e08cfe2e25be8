//! Working-branch lifecycle.
//!
//! Creates a working branch per target from the tip of its configured
//! base branch. Branch creation is not idempotent at the API level —
//! the host rejects duplicate refs — so idempotency is reconstructed as
//! a documented two-phase operation: attempt the create, then on
//! failure re-list branches and treat a pre-existing branch of the same
//! name as success.

use std::sync::Arc;

use tracing::debug;

use crate::notify::Notifier;
use crate::publish::model::RepoTarget;
use crate::remote::RemoteClient;

/// Outcome of deriving a working branch on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// A new ref was created at the base branch tip.
    Created,
    /// The branch already existed; the caller's intent is satisfied.
    AlreadyExists,
    /// The configured base branch does not exist — a configuration
    /// error, not an exception.
    BaseMissing,
    Failed,
}

impl BranchOutcome {
    /// `true` for the two outcomes that leave a usable working branch.
    pub fn is_success(&self) -> bool {
        matches!(self, BranchOutcome::Created | BranchOutcome::AlreadyExists)
    }
}

/// Creates or locates working branches across target repositories.
pub struct BranchLifecycleManager {
    client: Arc<dyn RemoteClient>,
    notifier: Arc<dyn Notifier>,
}

impl BranchLifecycleManager {
    pub fn new(client: Arc<dyn RemoteClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Derive `branch_name` from the tip of `target.base_branch`.
    pub async fn new_branch_on_repo(
        &self,
        branch_name: &str,
        target: &RepoTarget,
    ) -> BranchOutcome {
        let branches = match self.client.list_branches(&target.owner, &target.repo).await {
            Ok(branches) => branches,
            Err(err) => {
                if !err.is_cancelled() {
                    debug!("listing branches on {} failed: {err}", target.slug());
                }
                return BranchOutcome::Failed;
            }
        };
        let Some(base) = branches.iter().find(|b| b.name == target.base_branch) else {
            self.notifier.notify(&format!(
                "base branch {} not found on {}",
                target.base_branch,
                target.slug()
            ));
            return BranchOutcome::BaseMissing;
        };

        let reference = format!("refs/heads/{branch_name}");
        let created = self
            .client
            .create_ref(&target.owner, &target.repo, &reference, &base.head_sha)
            .await;
        match created {
            Ok(201) => {
                debug!("created branch {branch_name} on {}", target.slug());
                BranchOutcome::Created
            }
            other => {
                match other {
                    Ok(status) => debug!(
                        "creating {branch_name} on {} returned status {status}",
                        target.slug()
                    ),
                    Err(err) if !err.is_cancelled() => {
                        debug!("creating {branch_name} on {} failed: {err}", target.slug())
                    }
                    Err(_) => {}
                }
                // The host rejects duplicate refs; probe whether the
                // branch already exists before declaring failure.
                match self.client.list_branches(&target.owner, &target.repo).await {
                    Ok(again) if again.iter().any(|b| b.name == branch_name) => {
                        debug!("branch {branch_name} already exists on {}", target.slug());
                        BranchOutcome::AlreadyExists
                    }
                    Ok(_) => BranchOutcome::Failed,
                    Err(err) => {
                        if !err.is_cancelled() {
                            debug!("re-listing branches on {} failed: {err}", target.slug());
                        }
                        BranchOutcome::Failed
                    }
                }
            }
        }
    }

    /// Fan `new_branch_on_repo` out over every target; a failure on one
    /// target does not prevent attempts on the others. `true` when
    /// every target ended with a usable working branch.
    pub async fn new_branch(&self, branch_name: &str, targets: &[RepoTarget]) -> bool {
        let mut all_ok = true;
        for target in targets {
            let outcome = self.new_branch_on_repo(branch_name, target).await;
            all_ok &= outcome.is_success();
        }
        all_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::remote::fakes::MemoryRemote;

    fn target(owner: &str, repo: &str) -> RepoTarget {
        RepoTarget {
            owner: owner.to_string(),
            repo: repo.to_string(),
            base_branch: "main".to_string(),
            commit_msg: String::new(),
            auto_merge: false,
            auto_clean: false,
        }
    }

    fn manager(remote: Arc<MemoryRemote>) -> BranchLifecycleManager {
        BranchLifecycleManager::new(remote, Arc::new(RecordingNotifier::new()))
    }

    #[tokio::test]
    async fn creates_branch_from_base_tip() {
        let remote = Arc::new(MemoryRemote::new());
        remote.add_branch("a", "b", "main", "sha-0");
        let manager = manager(remote.clone());

        let outcome = manager.new_branch_on_repo("pub-1", &target("a", "b")).await;
        assert_eq!(outcome, BranchOutcome::Created);
        assert!(remote.branch_names("a", "b").contains(&"pub-1".to_string()));
    }

    #[tokio::test]
    async fn duplicate_creation_is_idempotent() {
        let remote = Arc::new(MemoryRemote::new());
        remote.add_branch("a", "b", "main", "sha-0");
        let manager = manager(remote.clone());
        let repo = target("a", "b");

        assert_eq!(
            manager.new_branch_on_repo("pub-1", &repo).await,
            BranchOutcome::Created
        );
        // Second call hits the duplicate-ref rejection, re-lists, and
        // finds the branch.
        assert_eq!(
            manager.new_branch_on_repo("pub-1", &repo).await,
            BranchOutcome::AlreadyExists
        );
        let names = remote.branch_names("a", "b");
        assert_eq!(
            names.iter().filter(|n| n.as_str() == "pub-1").count(),
            1,
            "no duplicate ref may exist"
        );
    }

    #[tokio::test]
    async fn missing_base_branch_is_a_configuration_error() {
        let remote = Arc::new(MemoryRemote::new());
        remote.add_branch("a", "b", "develop", "sha-0");
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = BranchLifecycleManager::new(remote, notifier.clone());

        let outcome = manager.new_branch_on_repo("pub-1", &target("a", "b")).await;
        assert_eq!(outcome, BranchOutcome::BaseMissing);
        assert!(!outcome.is_success());
        assert!(notifier.contains("base branch main not found"));
    }

    #[tokio::test]
    async fn fan_out_does_not_short_circuit() {
        let remote = Arc::new(MemoryRemote::new());
        remote.add_branch("a", "first", "develop", "sha-0"); // base missing
        remote.add_branch("a", "second", "main", "sha-0");
        let manager = manager(remote.clone());

        let ok = manager
            .new_branch("pub-1", &[target("a", "first"), target("a", "second")])
            .await;
        assert!(!ok);
        // The second target was still attempted.
        assert!(remote
            .branch_names("a", "second")
            .contains(&"pub-1".to_string()));
    }
}
