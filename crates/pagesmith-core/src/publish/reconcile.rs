//! Remote reconciliation: prune files from a target's managed subtree
//! that the local publication no longer maps to it.
//!
//! Deletions run sequentially, never in parallel: the quota is checked
//! once up front per prune and consumed by the following loop, and the
//! result lists stay stable in the remote listing's iteration order.
//! Parallelizing across independent targets would be safe; within one
//! target's deletion loop it would break the quota-then-consume
//! invariant.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{is_attachment, PruneConfig};
use crate::notify::Notifier;
use crate::publish::index_guard::IndexFileGuard;
use crate::publish::model::{DeletionOutcome, ManagedFileRef, MonoRepoContext, RepoTarget};
use crate::remote::{RemoteClient, RemoteFileEntry};

/// Diffs a target's remote listing against the locally-shared set and
/// deletes orphans, subject to exclusion rules, a rate-limit gate, and
/// the folder-index veto.
pub struct FileReconciler {
    client: Arc<dyn RemoteClient>,
    notifier: Arc<dyn Notifier>,
    guard: IndexFileGuard,
}

impl FileReconciler {
    pub fn new(client: Arc<dyn RemoteClient>, notifier: Arc<dyn Notifier>) -> Self {
        let guard = IndexFileGuard::new(Arc::clone(&client));
        Self {
            client,
            notifier,
            guard,
        }
    }

    /// Prune one target on `branch_name`.
    pub async fn prune_repo(
        &self,
        branch_name: &str,
        context: &MonoRepoContext,
        config: &PruneConfig,
    ) -> DeletionOutcome {
        let target = &context.target;
        if !target.auto_clean {
            return DeletionOutcome::noop();
        }

        let listing = match self
            .client
            .list_files(&target.owner, &target.repo, branch_name)
            .await
        {
            Ok(listing) => listing,
            Err(err) => {
                if !err.is_cancelled() {
                    warn!("listing files on {} failed: {err}", target.slug());
                }
                return DeletionOutcome::aborted();
            }
        };

        let candidates = filter_remote_files(&listing, config);

        // Quota gate: verified once up front, before any deletion. An
        // exhausted quota aborts the whole prune with no partial
        // progress.
        if config.rate_limit == 0 || candidates.len() > config.rate_limit {
            let remaining = self.client.remaining_quota().await.unwrap_or(0);
            if remaining == 0 {
                self.notifier.notify(&format!(
                    "API quota exhausted; skipping prune of {}",
                    target.slug()
                ));
                return DeletionOutcome::aborted();
            }
        }

        let mut deleted = Vec::new();
        let mut undeleted = Vec::new();
        for entry in &candidates {
            if !needs_deletion(entry, context) {
                continue;
            }
            let looks_like_index = !config.folder_index_name.is_empty()
                && entry.path.contains(&config.folder_index_name);
            if looks_like_index && self.guard.check_index_files(&entry.path, target).await {
                debug!("index veto protects {} on {}", entry.path, target.slug());
                continue;
            }

            info!("deleting {} from {}", entry.path, target.slug());
            let message = format!("DELETE FILE : {}", entry.path);
            let status = self
                .client
                .delete_file(
                    &target.owner,
                    &target.repo,
                    &entry.path,
                    &message,
                    &entry.sha,
                    branch_name,
                )
                .await;
            match status {
                Ok(200) => deleted.push(entry.path.clone()),
                Ok(status) => {
                    debug!("deleting {} returned status {status}", entry.path);
                    undeleted.push(entry.path.clone());
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    warn!("deleting {} from {} failed: {err}", entry.path, target.slug());
                    undeleted.push(entry.path.clone());
                }
            }
        }

        let summary = match (deleted.len(), undeleted.len()) {
            (0, 0) => "nothing to prune".to_string(),
            (ok, 0) => format!("pruned {ok} file(s)"),
            (0, bad) => format!("failed to prune {bad} file(s)"),
            (ok, bad) => format!("pruned {ok} file(s), {bad} failed"),
        };
        self.notifier
            .notify(&format!("{} on {}", summary, target.slug()));

        DeletionOutcome {
            success: undeleted.is_empty(),
            deleted,
            undeleted,
        }
    }

    /// Prune every target sequentially. Returns only the first target's
    /// outcome — the primary repository's reporting needs — while all
    /// targets are still processed. Callers needing every outcome call
    /// [`prune_repo`](Self::prune_repo) per target directly.
    pub async fn prune_repos(
        &self,
        branch_name: &str,
        targets: &[RepoTarget],
        shared: &[ManagedFileRef],
        config: &PruneConfig,
    ) -> DeletionOutcome {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let context = MonoRepoContext::new(target.clone(), shared.to_vec());
            outcomes.push(self.prune_repo(branch_name, &context, config).await);
        }
        outcomes.into_iter().next().unwrap_or_else(DeletionOutcome::noop)
    }
}

/// Managed-subtree filter: keep entries under the configured folders,
/// not excluded, with a supported extension. Inconsistent folder
/// settings yield no candidates at all — a safety fallback rather than
/// an error.
pub fn filter_remote_files(
    listing: &[RemoteFileEntry],
    config: &PruneConfig,
) -> Vec<RemoteFileEntry> {
    if config.is_inconsistent() {
        return Vec::new();
    }
    let exclusions = config.compiled_exclusions();
    let uses_root = config.behavior == crate::config::UploadBehavior::FrontMatterRoot;
    listing
        .iter()
        .filter(|entry| {
            let path = entry.path.as_str();
            let in_subtree = path.contains(&config.default_folder)
                || (uses_root && path.contains(&config.root_folder))
                || (!config.attachment_folder.is_empty()
                    && path.contains(&config.attachment_folder));
            in_subtree
                && !exclusions.iter().any(|rule| rule.matches(path))
                && (is_attachment(path) || path.ends_with(".md"))
        })
        .cloned()
        .collect()
}

/// Candidate decision for one remote file:
/// - mapped to this target ⇒ protected;
/// - mapped only to other targets ⇒ still a candidate when markdown (a
///   stale copy under this target must go even though the document is
///   shared elsewhere), protected otherwise;
/// - unmapped ⇒ candidate.
fn needs_deletion(entry: &RemoteFileEntry, context: &MonoRepoContext) -> bool {
    if context.is_mapped_anywhere(&entry.path) {
        entry.path.trim().ends_with(".md") && !context.is_mapped_here(&entry.path)
    } else {
        true
    }
}
