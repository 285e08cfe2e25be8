//! Pull-request coordination and the per-target update sequence.
//!
//! Per-target state machine:
//! `NoBranch → BranchCreated → PROpened → (Merged → BranchDeleted) | PRLeftOpen`.
//! Terminal states are `BranchDeleted`, `PRLeftOpen` and `Failed`; no
//! transition is retried automatically — each failure is terminal for
//! that target within the current run. Every "retry" here is a single
//! alternate-path lookup, not a repeated request.

use std::sync::Arc;

use tracing::debug;

use crate::notify::Notifier;
use crate::publish::model::RepoTarget;
use crate::remote::RemoteClient;

/// Sentinel PR number meaning "no usable pull request".
pub const NO_PULL_REQUEST: u64 = 0;

/// Opens, merges and cleans up pull requests for working branches, and
/// aggregates multi-repo outcomes.
pub struct PullRequestCoordinator {
    client: Arc<dyn RemoteClient>,
    notifier: Arc<dyn Notifier>,
}

impl PullRequestCoordinator {
    pub fn new(client: Arc<dyn RemoteClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Open a pull request from `branch_name` into the target's base
    /// branch, or locate an existing one. Returns [`NO_PULL_REQUEST`]
    /// when neither path produced a usable number.
    pub async fn pull_request_on_repo(&self, branch_name: &str, target: &RepoTarget) -> u64 {
        let title = format!("[PUBLISHER] Merge {branch_name}");
        let created = self
            .client
            .create_pull_request(
                &target.owner,
                &target.repo,
                branch_name,
                &target.base_branch,
                &title,
                "",
            )
            .await;
        match created {
            Ok(pr) => pr.number,
            Err(err) => {
                if !err.is_cancelled() {
                    debug!("opening PR for {branch_name} on {} failed: {err}", target.slug());
                }
                // A PR may already exist for this branch; fall back to
                // the first open one.
                match self
                    .client
                    .list_open_pull_requests(&target.owner, &target.repo)
                    .await
                {
                    Ok(open) if !open.is_empty() => open[0].number,
                    Ok(_) => {
                        self.notifier.notify(&format!(
                            "no pull request could be opened for {branch_name} on {}",
                            target.slug()
                        ));
                        NO_PULL_REQUEST
                    }
                    Err(err) => {
                        if !err.is_cancelled() {
                            debug!("listing open PRs on {} failed: {err}", target.slug());
                        }
                        self.notifier.notify(&format!(
                            "no pull request could be opened for {branch_name} on {}",
                            target.slug()
                        ));
                        NO_PULL_REQUEST
                    }
                }
            }
        }
    }

    /// Squash-merge pull request `number`. The commit title comes from
    /// the target's template when non-blank. Merge conflicts are
    /// reported and not retried.
    pub async fn merge_pull_request_on_repo(&self, number: u64, target: &RepoTarget) -> bool {
        let commit_title = if target.commit_msg.trim().is_empty() {
            format!("[PUBLISHER] Merge #{number}")
        } else {
            format!("{} #{number}", target.commit_msg)
        };
        let merged = self
            .client
            .merge_pull_request(&target.owner, &target.repo, number, &commit_title)
            .await;
        match merged {
            Ok(200) => true,
            Ok(status) => {
                debug!("merging #{number} on {} returned status {status}", target.slug());
                self.notifier.notify(&format!(
                    "pull request #{number} on {} could not be merged (conflict)",
                    target.slug()
                ));
                false
            }
            Err(err) => {
                if !err.is_cancelled() {
                    debug!("merging #{number} on {} failed: {err}", target.slug());
                    self.notifier.notify(&format!(
                        "pull request #{number} on {} could not be merged (conflict)",
                        target.slug()
                    ));
                }
                false
            }
        }
    }

    /// Delete the working branch after a merge. Best-effort: failures
    /// are swallowed and never propagate as fatal.
    pub async fn delete_branch_on_repo(&self, branch_name: &str, target: &RepoTarget) -> bool {
        match self
            .client
            .delete_ref(&target.owner, &target.repo, branch_name)
            .await
        {
            Ok(status) => (200..300).contains(&status),
            Err(_) => false,
        }
    }

    /// Full update sequence for one target: open (or locate) the PR;
    /// when auto-merge is configured, merge it and — only on merge
    /// success — delete the working branch. A usable PR left open for
    /// manual merge is a success; no usable PR is a failure.
    pub async fn update_repository_on_one(&self, branch_name: &str, target: &RepoTarget) -> bool {
        let number = self.pull_request_on_repo(branch_name, target).await;
        if number == NO_PULL_REQUEST {
            return false;
        }
        if !target.auto_merge {
            return true;
        }
        if self.merge_pull_request_on_repo(number, target).await {
            self.delete_branch_on_repo(branch_name, target).await;
            true
        } else {
            false
        }
    }

    /// Run the update sequence over every target. Overall success is a
    /// logical OR across targets: a partial multi-repo failure is not a
    /// full failure.
    pub async fn update_repository(&self, branch_name: &str, targets: &[RepoTarget]) -> bool {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.update_repository_on_one(branch_name, target).await);
        }
        results.iter().any(|&ok| ok)
    }
}
