//! Abstract remote operations against a Git-hosting REST API.
//!
//! [`RemoteClient`] is the seam between the orchestration logic and the
//! wire: inject [`GithubRest`](crate::remote::GithubRest) for real use,
//! or [`MemoryRemote`](crate::remote::fakes::MemoryRemote) for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::remote::error::RemoteResult;

/// One branch as reported by a repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    /// Commit sha at the branch tip.
    pub head_sha: String,
}

/// One file as reported by a recursive tree listing: a path plus the
/// content hash identifying its remote state at that point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileEntry {
    pub path: String,
    pub sha: String,
}

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
}

/// File content fetched from the remote, still base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContent {
    pub content_base64: String,
    pub sha: String,
}

/// Named REST operations against a Git-hosting API.
///
/// Operations whose callers classify HTTP statuses themselves (existence
/// checks, ref creation/deletion, merges) return the raw status code on
/// the `Ok` path; the `Err` channel is reserved for transport failures,
/// decode failures, and caller-side cancellation.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// List all branches of a repository.
    async fn list_branches(&self, owner: &str, repo: &str) -> RemoteResult<Vec<BranchInfo>>;

    /// Create a ref (e.g. `refs/heads/foo`) at a commit sha. The host
    /// rejects duplicate refs with a conflict status.
    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> RemoteResult<u16>;

    /// Delete a branch ref. Best-effort for callers; never fatal.
    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16>;

    /// Open a pull request from `head` into `base`.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> RemoteResult<PullRequestInfo>;

    /// List open pull requests, in the host's iteration order.
    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> RemoteResult<Vec<PullRequestInfo>>;

    /// Squash-merge a pull request with the given commit title.
    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
    ) -> RemoteResult<u16>;

    /// Repository metadata check (200 | 404 | 403 | 301).
    async fn get_repository(&self, owner: &str, repo: &str) -> RemoteResult<u16>;

    /// Branch metadata check (200 | 404 | 403).
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16>;

    /// Fetch file content at `path` on the default branch.
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> RemoteResult<RemoteContent>;

    /// Delete file content at `path` on `branch`. `sha` must match the
    /// current remote content hash (optimistic concurrency); a stale
    /// hash fails the delete.
    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        message: &str,
        sha: &str,
        branch: &str,
    ) -> RemoteResult<u16>;

    /// Recursive file listing of `branch`.
    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> RemoteResult<Vec<RemoteFileEntry>>;

    /// Remaining API quota for the authenticated caller.
    async fn remaining_quota(&self) -> RemoteResult<u64>;
}
