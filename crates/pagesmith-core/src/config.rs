//! Prune/upload behavior configuration.
//!
//! Configuration is an explicit value threaded into each operation at
//! call time; no component reads ambient global settings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How local documents map onto remote paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadBehavior {
    /// Every note is written to one fixed remote path. Pruning never
    /// applies in this mode.
    Fixed,
    /// The remote root folder is read from each note's front matter.
    FrontMatterRoot,
    /// The remote tree mirrors the local layout under the default
    /// output folder.
    LocalTree,
}

/// Configuration for a prune run, shared across all targets of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneConfig {
    pub behavior: UploadBehavior,
    /// Root folder for [`UploadBehavior::FrontMatterRoot`].
    #[serde(default)]
    pub root_folder: String,
    /// Default output folder for published documents.
    #[serde(default)]
    pub default_folder: String,
    /// Folder holding uploaded attachments, empty to disable.
    #[serde(default)]
    pub attachment_folder: String,
    /// Exclusion rules: literal substrings or `/pattern/flags` regexes.
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Per-run deletion quota threshold; 0 forces a remaining-quota
    /// check before any prune.
    #[serde(default)]
    pub rate_limit: usize,
    /// Filename convention marking folder index files, empty to skip
    /// the index guard entirely.
    #[serde(default)]
    pub folder_index_name: String,
}

impl PruneConfig {
    /// `true` when the folder settings cannot identify a managed
    /// subtree. The filter then yields no candidates at all, a safety
    /// fallback rather than an error.
    pub fn is_inconsistent(&self) -> bool {
        (self.behavior == UploadBehavior::FrontMatterRoot && self.root_folder.is_empty())
            || self.default_folder.is_empty()
            || self.behavior == UploadBehavior::Fixed
    }

    /// Compile the exclusion rules once for a run.
    pub fn compiled_exclusions(&self) -> Vec<ExclusionRule> {
        self.exclusions
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| ExclusionRule::parse(raw))
            .collect()
    }
}

/// One exclusion rule, compiled from its configured form.
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Plain substring match.
    Literal(String),
    /// `/pattern/flags` form. Only the `i` flag alters matching here;
    /// the remaining JS-style flags do not change a boolean test.
    Pattern(Regex),
}

impl ExclusionRule {
    pub fn parse(raw: &str) -> Self {
        if let Some(stripped) = raw.strip_prefix('/') {
            if let Some(slash) = stripped.rfind('/') {
                let (pattern, flags) = stripped.split_at(slash);
                let flags = &flags[1..];
                if flags.chars().all(|c| "igmsuy".contains(c)) {
                    let source = if flags.contains('i') {
                        format!("(?i){pattern}")
                    } else {
                        pattern.to_string()
                    };
                    match Regex::new(&source) {
                        Ok(regex) => return ExclusionRule::Pattern(regex),
                        Err(err) => {
                            debug!("invalid exclusion regex {raw:?}: {err}");
                        }
                    }
                }
            }
        }
        ExclusionRule::Literal(raw.trim().to_string())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExclusionRule::Literal(literal) => {
                !literal.is_empty() && path.trim().contains(literal)
            }
            ExclusionRule::Pattern(regex) => regex.is_match(path),
        }
    }
}

/// Attachment extensions the remote host renders; anything else is not
/// managed and never pruned.
const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "mp3", "wav", "ogg", "m4a", "flac", "mp4",
    "webm", "ogv", "mov", "mkv", "pdf",
];

/// `true` when the path carries a supported attachment extension.
pub fn is_attachment(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, extension)) => ATTACHMENT_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known)),
        None => false,
    }
}
