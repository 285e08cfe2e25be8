//! In-memory fake of [`RemoteClient`] (testing only).
//!
//! `MemoryRemote` satisfies the trait contract without touching the
//! network. Failure paths are scriptable: merges can be forced to
//! conflict, individual file deletes can be forced to fail or to look
//! like caller-side cancellations, repository and branch checks can
//! answer with a fixed HTTP status, and the remaining quota can be set.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::remote::client::{
    BranchInfo, PullRequestInfo, RemoteClient, RemoteContent, RemoteFileEntry,
};
use crate::remote::error::{RemoteError, RemoteResult};

#[derive(Debug, Default)]
struct RepoState {
    branches: Vec<BranchInfo>,
    files: Vec<StoredFile>,
    open_prs: Vec<u64>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    path: String,
    sha: String,
    content_base64: String,
}

#[derive(Debug, Default)]
struct Inner {
    repos: HashMap<String, RepoState>,
    next_pr_number: u64,
    quota: u64,
    fail_merges: bool,
    fail_repo_checks: HashSet<String>,
    repo_statuses: HashMap<String, u16>,
    branch_statuses: HashMap<String, u16>,
    fail_deletes: HashSet<String>,
    cancel_deletes: HashSet<String>,
    delete_calls: usize,
}

/// In-memory Git-hosting fake backed by a `HashMap<owner/repo, state>`.
#[derive(Debug)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
}

fn key(owner: &str, repo: &str) -> String {
    format!("{owner}/{repo}")
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_pr_number: 1,
                quota: 5000,
                ..Inner::default()
            }),
        }
    }

    /// Register an empty repository.
    pub fn add_repo(&self, owner: &str, repo: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.repos.entry(key(owner, repo)).or_default();
    }

    /// Register a branch on a repository (creating the repo if needed).
    pub fn add_branch(&self, owner: &str, repo: &str, name: &str, head_sha: &str) {
        let mut inner = self.inner.lock().unwrap();
        let state = inner.repos.entry(key(owner, repo)).or_default();
        state.branches.push(BranchInfo {
            name: name.to_string(),
            head_sha: head_sha.to_string(),
        });
    }

    /// Register a file with plain-text content; stored base64-encoded
    /// the way the real API reports it.
    pub fn add_file(&self, owner: &str, repo: &str, path: &str, sha: &str, content: &str) {
        let mut inner = self.inner.lock().unwrap();
        let state = inner.repos.entry(key(owner, repo)).or_default();
        state.files.push(StoredFile {
            path: path.to_string(),
            sha: sha.to_string(),
            content_base64: STANDARD.encode(content),
        });
    }

    /// Set the remaining API quota reported by [`remaining_quota`].
    ///
    /// [`remaining_quota`]: RemoteClient::remaining_quota
    pub fn set_quota(&self, quota: u64) {
        self.inner.lock().unwrap().quota = quota;
    }

    /// Force every merge attempt to report a conflict.
    pub fn fail_merges(&self) {
        self.inner.lock().unwrap().fail_merges = true;
    }

    /// Make repository metadata checks of `owner/repo` fail at the
    /// transport level instead of answering with an HTTP status.
    pub fn fail_repo_check_of(&self, owner: &str, repo: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_repo_checks
            .insert(key(owner, repo));
    }

    /// Make repository metadata checks of `owner/repo` answer with a
    /// fixed HTTP status, e.g. 403 or 301.
    pub fn set_repo_status(&self, owner: &str, repo: &str, status: u16) {
        self.inner
            .lock()
            .unwrap()
            .repo_statuses
            .insert(key(owner, repo), status);
    }

    /// Make checks of `branch` on `owner/repo` answer with a fixed HTTP
    /// status.
    pub fn set_branch_status(&self, owner: &str, repo: &str, branch: &str, status: u16) {
        self.inner
            .lock()
            .unwrap()
            .branch_statuses
            .insert(format!("{}#{branch}", key(owner, repo)), status);
    }

    /// Force deletes of `path` to fail with an HTTP conflict.
    pub fn fail_delete_of(&self, path: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_deletes
            .insert(path.to_string());
    }

    /// Make deletes of `path` look like a caller-side request abort.
    pub fn cancel_delete_of(&self, path: &str) {
        self.inner
            .lock()
            .unwrap()
            .cancel_deletes
            .insert(path.to_string());
    }

    /// Number of delete-content calls issued so far.
    pub fn delete_calls(&self) -> usize {
        self.inner.lock().unwrap().delete_calls
    }

    /// Branch names currently present on `owner/repo`.
    pub fn branch_names(&self, owner: &str, repo: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| state.branches.iter().map(|b| b.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Paths currently present on `owner/repo`.
    pub fn file_paths(&self, owner: &str, repo: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| state.files.iter().map(|f| f.path.clone()).collect())
            .unwrap_or_default()
    }

    /// Numbers of pull requests currently open on `owner/repo`.
    pub fn open_pr_numbers(&self, owner: &str, repo: &str) -> Vec<u64> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| state.open_prs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteClient for MemoryRemote {
    async fn list_branches(&self, owner: &str, repo: &str) -> RemoteResult<Vec<BranchInfo>> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| state.branches.clone())
            .ok_or(RemoteError::Status { code: 404 })
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> RemoteResult<u16> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .repos
            .get_mut(&key(owner, repo))
            .ok_or(RemoteError::Status { code: 404 })?;
        let name = reference.trim_start_matches("refs/heads/");
        if state.branches.iter().any(|b| b.name == name) {
            // Duplicate ref: the host answers with a validation error.
            return Ok(422);
        }
        state.branches.push(BranchInfo {
            name: name.to_string(),
            head_sha: sha.to_string(),
        });
        Ok(201)
    }

    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .repos
            .get_mut(&key(owner, repo))
            .ok_or(RemoteError::Status { code: 404 })?;
        let before = state.branches.len();
        state.branches.retain(|b| b.name != branch);
        if state.branches.len() < before {
            Ok(204)
        } else {
            Ok(422)
        }
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        _base: &str,
        _title: &str,
        _body: &str,
    ) -> RemoteResult<PullRequestInfo> {
        let mut inner = self.inner.lock().unwrap();
        let number = inner.next_pr_number;
        let state = inner
            .repos
            .get_mut(&key(owner, repo))
            .ok_or(RemoteError::Status { code: 404 })?;
        if !state.branches.iter().any(|b| b.name == head) {
            return Err(RemoteError::Status { code: 422 });
        }
        if !state.open_prs.is_empty() {
            // One open PR per working branch in this fake; a second
            // create reports the same validation error as the host.
            return Err(RemoteError::Status { code: 422 });
        }
        state.open_prs.push(number);
        inner.next_pr_number += 1;
        Ok(PullRequestInfo { number })
    }

    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> RemoteResult<Vec<PullRequestInfo>> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| {
                state
                    .open_prs
                    .iter()
                    .map(|&number| PullRequestInfo { number })
                    .collect()
            })
            .ok_or(RemoteError::Status { code: 404 })
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        _commit_title: &str,
    ) -> RemoteResult<u16> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_merges {
            return Ok(405);
        }
        let state = inner
            .repos
            .get_mut(&key(owner, repo))
            .ok_or(RemoteError::Status { code: 404 })?;
        let before = state.open_prs.len();
        state.open_prs.retain(|&n| n != number);
        if state.open_prs.len() < before {
            Ok(200)
        } else {
            Ok(404)
        }
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> RemoteResult<u16> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_repo_checks.contains(&key(owner, repo)) {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        if let Some(&status) = inner.repo_statuses.get(&key(owner, repo)) {
            return Ok(status);
        }
        if inner.repos.contains_key(&key(owner, repo)) {
            Ok(200)
        } else {
            Ok(404)
        }
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16> {
        let inner = self.inner.lock().unwrap();
        if let Some(&status) = inner
            .branch_statuses
            .get(&format!("{}#{branch}", key(owner, repo)))
        {
            return Ok(status);
        }
        match inner.repos.get(&key(owner, repo)) {
            Some(state) if state.branches.iter().any(|b| b.name == branch) => Ok(200),
            Some(_) => Ok(404),
            None => Ok(404),
        }
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> RemoteResult<RemoteContent> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .and_then(|state| state.files.iter().find(|f| f.path == path))
            .map(|f| RemoteContent {
                content_base64: f.content_base64.clone(),
                sha: f.sha.clone(),
            })
            .ok_or(RemoteError::Status { code: 404 })
    }

    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        _message: &str,
        sha: &str,
        _branch: &str,
    ) -> RemoteResult<u16> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_calls += 1;
        if inner.cancel_deletes.contains(path) {
            return Err(RemoteError::Cancelled);
        }
        if inner.fail_deletes.contains(path) {
            return Err(RemoteError::Status { code: 409 });
        }
        let state = inner
            .repos
            .get_mut(&key(owner, repo))
            .ok_or(RemoteError::Status { code: 404 })?;
        let Some(position) = state.files.iter().position(|f| f.path == path) else {
            return Ok(404);
        };
        if state.files[position].sha != sha {
            // Stale content hash: optimistic concurrency failure.
            return Ok(409);
        }
        state.files.remove(position);
        Ok(200)
    }

    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        _branch: &str,
    ) -> RemoteResult<Vec<RemoteFileEntry>> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(&key(owner, repo))
            .map(|state| {
                state
                    .files
                    .iter()
                    .map(|f| RemoteFileEntry {
                        path: f.path.clone(),
                        sha: f.sha.clone(),
                    })
                    .collect()
            })
            .ok_or(RemoteError::Status { code: 404 })
    }

    async fn remaining_quota(&self) -> RemoteResult<u64> {
        Ok(self.inner.lock().unwrap().quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_ref_then_duplicate_reports_conflict() {
        let remote = MemoryRemote::new();
        remote.add_branch("a", "b", "main", "sha-0");
        let first = remote
            .create_ref("a", "b", "refs/heads/pub-1", "sha-0")
            .await
            .unwrap();
        assert_eq!(first, 201);
        let second = remote
            .create_ref("a", "b", "refs/heads/pub-1", "sha-0")
            .await
            .unwrap();
        assert_eq!(second, 422);
        assert_eq!(remote.branch_names("a", "b"), vec!["main", "pub-1"]);
    }

    #[tokio::test]
    async fn delete_file_requires_matching_sha() {
        let remote = MemoryRemote::new();
        remote.add_file("a", "b", "docs/x.md", "sha-1", "hello");
        let stale = remote
            .delete_file("a", "b", "docs/x.md", "m", "sha-stale", "pub-1")
            .await
            .unwrap();
        assert_eq!(stale, 409);
        let fresh = remote
            .delete_file("a", "b", "docs/x.md", "m", "sha-1", "pub-1")
            .await
            .unwrap();
        assert_eq!(fresh, 200);
        assert!(remote.file_paths("a", "b").is_empty());
        assert_eq!(remote.delete_calls(), 2);
    }

    #[tokio::test]
    async fn get_file_content_round_trips_base64() {
        let remote = MemoryRemote::new();
        remote.add_file("a", "b", "docs/x.md", "sha-1", "---\nindex: true\n---\n");
        let content = remote.get_file_content("a", "b", "docs/x.md").await.unwrap();
        let decoded = STANDARD.decode(content.content_base64).unwrap();
        assert!(String::from_utf8(decoded).unwrap().contains("index: true"));
    }
}
