//! GitHub v3 REST implementation of [`RemoteClient`].
//!
//! Redirects are disabled so that a 301 (repository moved) surfaces to
//! the validator instead of being followed silently.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::remote::client::{
    BranchInfo, PullRequestInfo, RemoteClient, RemoteContent, RemoteFileEntry,
};
use crate::remote::error::{RemoteError, RemoteResult};

/// GitHub REST client. Cheap to clone; the underlying connection pool
/// is shared.
#[derive(Debug, Clone)]
pub struct GithubRest {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubRest {
    /// Client against the public `api.github.com` endpoint.
    pub fn new(token: Option<String>) -> RemoteResult<Self> {
        Self::with_base("https://api.github.com", token)
    }

    /// Client against an alternate API base (GitHub Enterprise, test
    /// servers).
    pub fn with_base(api_base: &str, token: Option<String>) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pagesmith/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.api_base, path))
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))
    }

    async fn decode<T: serde::de::DeserializeOwned>(&self, response: Response) -> RemoteResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                code: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
struct BranchRow {
    name: String,
    commit: CommitRow,
}

#[derive(Deserialize)]
struct CommitRow {
    sha: String,
}

#[derive(Deserialize)]
struct PullRow {
    number: u64,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeRow>,
}

#[derive(Deserialize)]
struct TreeRow {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentRow {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitCore,
}

#[derive(Deserialize)]
struct RateLimitCore {
    remaining: u64,
}

#[async_trait]
impl RemoteClient for GithubRest {
    async fn list_branches(&self, owner: &str, repo: &str) -> RemoteResult<Vec<BranchInfo>> {
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{owner}/{repo}/branches")))
            .await?;
        let rows: Vec<BranchRow> = self.decode(response).await?;
        Ok(rows
            .into_iter()
            .map(|row| BranchInfo {
                name: row.name,
                head_sha: row.commit.sha,
            })
            .collect())
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> RemoteResult<u16> {
        let response = self
            .send(
                self.request(Method::POST, &format!("/repos/{owner}/{repo}/git/refs"))
                    .json(&serde_json::json!({ "ref": reference, "sha": sha })),
            )
            .await?;
        Ok(response.status().as_u16())
    }

    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16> {
        let response = self
            .send(self.request(
                Method::DELETE,
                &format!("/repos/{owner}/{repo}/git/refs/heads/{branch}"),
            ))
            .await?;
        Ok(response.status().as_u16())
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> RemoteResult<PullRequestInfo> {
        let response = self
            .send(
                self.request(Method::POST, &format!("/repos/{owner}/{repo}/pulls"))
                    .json(&serde_json::json!({
                        "title": title,
                        "body": body,
                        "head": head,
                        "base": base,
                    })),
            )
            .await?;
        let row: PullRow = self.decode(response).await?;
        Ok(PullRequestInfo { number: row.number })
    }

    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> RemoteResult<Vec<PullRequestInfo>> {
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{owner}/{repo}/pulls?state=open")))
            .await?;
        let rows: Vec<PullRow> = self.decode(response).await?;
        Ok(rows
            .into_iter()
            .map(|row| PullRequestInfo { number: row.number })
            .collect())
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
    ) -> RemoteResult<u16> {
        let response = self
            .send(
                self.request(
                    Method::PUT,
                    &format!("/repos/{owner}/{repo}/pulls/{number}/merge"),
                )
                .json(&serde_json::json!({
                    "commit_title": commit_title,
                    "merge_method": "squash",
                })),
            )
            .await?;
        Ok(response.status().as_u16())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> RemoteResult<u16> {
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{owner}/{repo}")))
            .await?;
        Ok(response.status().as_u16())
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> RemoteResult<u16> {
        let response = self
            .send(self.request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/branches/{branch}"),
            ))
            .await?;
        Ok(response.status().as_u16())
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> RemoteResult<RemoteContent> {
        let response = self
            .send(self.request(Method::GET, &format!("/repos/{owner}/{repo}/contents/{path}")))
            .await?;
        let row: ContentRow = self.decode(response).await?;
        Ok(RemoteContent {
            content_base64: row.content,
            sha: row.sha,
        })
    }

    async fn delete_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        message: &str,
        sha: &str,
        branch: &str,
    ) -> RemoteResult<u16> {
        let response = self
            .send(
                self.request(
                    Method::DELETE,
                    &format!("/repos/{owner}/{repo}/contents/{path}"),
                )
                .json(&serde_json::json!({
                    "message": message,
                    "sha": sha,
                    "branch": branch,
                })),
            )
            .await?;
        Ok(response.status().as_u16())
    }

    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> RemoteResult<Vec<RemoteFileEntry>> {
        let response = self
            .send(self.request(
                Method::GET,
                &format!("/repos/{owner}/{repo}/git/trees/{branch}?recursive=true"),
            ))
            .await?;
        let tree: TreeResponse = self.decode(response).await?;
        Ok(tree
            .tree
            .into_iter()
            .filter(|row| row.kind == "blob")
            .map(|row| RemoteFileEntry {
                path: row.path,
                sha: row.sha,
            })
            .collect())
    }

    async fn remaining_quota(&self) -> RemoteResult<u64> {
        let response = self.send(self.request(Method::GET, "/rate_limit")).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // Hosts without rate limiting report 404 here.
            return Ok(u64::MAX);
        }
        let limits: RateLimitResponse = self.decode(response).await?;
        Ok(limits.resources.core.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_trims_trailing_slash() {
        let client = GithubRest::with_base("https://ghe.example.com/api/v3/", None).unwrap();
        assert_eq!(client.api_base, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn tree_rows_deserialize() {
        let raw = r#"{"tree":[
            {"path":"docs/a.md","sha":"abc","type":"blob"},
            {"path":"docs","sha":"def","type":"tree"}
        ]}"#;
        let parsed: TreeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.tree.len(), 2);
        assert_eq!(parsed.tree[0].kind, "blob");
    }

    #[test]
    fn rate_limit_deserializes() {
        let raw = r#"{"resources":{"core":{"remaining":4321}}}"#;
        let parsed: RateLimitResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.resources.core.remaining, 4321);
    }
}
