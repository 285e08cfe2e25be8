//! Deletion veto for folder index files.
//!
//! Before a candidate matching the folder-index naming convention is
//! deleted, its current remote front matter is inspected. Deletion is
//! vetoed when the file declares `index: true`, `delete: false`, or is
//! not shared (`share` falsy or absent).

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::frontmatter;
use crate::publish::model::RepoTarget;
use crate::remote::RemoteClient;

/// Inspects remote front matter to protect folder index files from
/// pruning.
pub struct IndexFileGuard {
    client: Arc<dyn RemoteClient>,
}

impl IndexFileGuard {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// `true` vetoes the deletion of `path`. Any fetch or parse failure
    /// means "do not veto" — deletion proceeds — except a caller-side
    /// request cancellation, which is a silent no-op.
    pub async fn check_index_files(&self, path: &str, target: &RepoTarget) -> bool {
        let content = match self
            .client
            .get_file_content(&target.owner, &target.repo, path)
            .await
        {
            Ok(content) => content,
            Err(err) => {
                if !err.is_cancelled() {
                    debug!("fetching {path} from {} failed: {err}", target.slug());
                }
                return false;
            }
        };

        // The host wraps base64 payloads with newlines.
        let stripped: String = content
            .content_base64
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let decoded = match STANDARD.decode(stripped) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    debug!("content of {path} is not valid UTF-8: {err}");
                    return false;
                }
            },
            Err(err) => {
                debug!("content of {path} is not valid base64: {err}");
                return false;
            }
        };

        let Some(block) = frontmatter::extract_block(&decoded) else {
            return false;
        };
        let Some(keys) = frontmatter::parse_flat(block) else {
            return false;
        };

        frontmatter::is_truthy(keys.get("index"))
            || frontmatter::is_explicitly_false(keys.get("delete"))
            || !frontmatter::is_truthy(keys.get("share"))
    }
}
