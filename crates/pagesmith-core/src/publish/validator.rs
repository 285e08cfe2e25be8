//! Pre-flight validation of publish targets.
//!
//! Confirms each target repository and its configured base branch
//! exist before any write operation. Read-only; no retries.

use std::sync::Arc;

use tracing::debug;

use crate::notify::Notifier;
use crate::publish::model::RepoTarget;
use crate::remote::RemoteClient;

/// Classified validation failure for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    RepoNotFound,
    RepoForbidden,
    RepoMoved,
    BranchNotFound,
    BranchForbidden,
    /// Failure outside the classified HTTP statuses (transport, decode).
    Unexpected(String),
}

impl ValidationIssue {
    fn describe(&self, target: &RepoTarget) -> String {
        match self {
            ValidationIssue::RepoNotFound => {
                format!("repository {} was not found (404)", target.slug())
            }
            ValidationIssue::RepoForbidden => {
                format!("repository {} is not accessible (403)", target.slug())
            }
            ValidationIssue::RepoMoved => {
                format!("repository {} has moved (301); update the target", target.slug())
            }
            ValidationIssue::BranchNotFound => format!(
                "branch {} was not found on {} (404)",
                target.base_branch,
                target.slug()
            ),
            ValidationIssue::BranchForbidden => format!(
                "branch {} on {} is not accessible (403)",
                target.base_branch,
                target.slug()
            ),
            ValidationIssue::Unexpected(detail) => {
                format!("checking {} failed: {detail}", target.slug())
            }
        }
    }
}

/// Result of validating a list of targets. When validation aborted
/// early, targets after the aborting one carry no entry.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<(RepoTarget, ValidationIssue)>,
    /// `true` when an unclassified failure stopped the remaining list.
    pub aborted: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty() && !self.aborted
    }
}

/// Validates that targets and their base branches exist.
pub struct RepoValidator {
    client: Arc<dyn RemoteClient>,
    notifier: Arc<dyn Notifier>,
    /// Stop validating the remaining targets when a check fails outside
    /// the classified HTTP statuses. On by default, matching the
    /// long-standing behavior some callers rely on; classified HTTP
    /// failures always continue to the next target.
    abort_on_unexpected: bool,
}

impl RepoValidator {
    pub fn new(client: Arc<dyn RemoteClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            abort_on_unexpected: true,
        }
    }

    pub fn continue_on_unexpected(mut self) -> Self {
        self.abort_on_unexpected = false;
        self
    }

    /// Check every target: repository existence, then base-branch
    /// existence. With `silent` unset, fully valid targets produce a
    /// success notice.
    pub async fn check_repositories(
        &self,
        targets: &[RepoTarget],
        silent: bool,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        for target in targets {
            match self.check_one(target, silent).await {
                Ok(None) => {}
                Ok(Some(issue)) => report.issues.push((target.clone(), issue)),
                Err(issue) => {
                    self.notifier.notify(&issue.describe(target));
                    report.issues.push((target.clone(), issue));
                    if self.abort_on_unexpected {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        report
    }

    /// `Ok(Some(_))` is a classified failure (validation continues with
    /// the next target); `Err(_)` is unclassified and may abort the
    /// remaining list.
    async fn check_one(
        &self,
        target: &RepoTarget,
        silent: bool,
    ) -> Result<Option<ValidationIssue>, ValidationIssue> {
        let repo_status = self
            .client
            .get_repository(&target.owner, &target.repo)
            .await
            .map_err(|e| ValidationIssue::Unexpected(e.to_string()))?;

        let issue = match repo_status {
            200 => None,
            404 => Some(ValidationIssue::RepoNotFound),
            403 => Some(ValidationIssue::RepoForbidden),
            301 => Some(ValidationIssue::RepoMoved),
            other => Some(ValidationIssue::Unexpected(format!(
                "repository check returned status {other}"
            ))),
        };
        if let Some(issue) = issue {
            self.notifier.notify(&issue.describe(target));
            return Ok(Some(issue));
        }
        debug!("repository {} exists, checking base branch", target.slug());

        let branch_status = self
            .client
            .get_branch(&target.owner, &target.repo, &target.base_branch)
            .await
            .map_err(|e| ValidationIssue::Unexpected(e.to_string()))?;

        let issue = match branch_status {
            200 => None,
            404 => Some(ValidationIssue::BranchNotFound),
            403 => Some(ValidationIssue::BranchForbidden),
            other => Some(ValidationIssue::Unexpected(format!(
                "branch check returned status {other}"
            ))),
        };
        match issue {
            Some(issue) => {
                self.notifier.notify(&issue.describe(target));
                Ok(Some(issue))
            }
            None => {
                if !silent {
                    self.notifier
                        .notify(&format!("{} is configured correctly", target.slug()));
                }
                Ok(None)
            }
        }
    }
}
