//! Pagesmith - publication mirror driver.
//!
//! ## Commands
//!
//! - `check`: validate every configured target repository and base branch
//! - `update`: finalize a publish run — derive working branches, open
//!   pull requests, merge and clean up where auto-merge is configured
//! - `prune`: remove orphaned remote files from each target's managed
//!   subtree, then merge the cleanup branch

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};

use pagesmith_core::{
    init_tracing, BranchLifecycleManager, FileReconciler, GithubRest, LogNotifier, ManagedFileRef,
    Notifier, PruneConfig, PullRequestCoordinator, RemoteClient, RepoTarget, RepoValidator,
};

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish a document vault to Git-hosted mirrors", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "pagesmith.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every configured target repository and base branch
    Check,

    /// Finalize a publish run: working branch, pull request, and merge
    Update {
        /// Working branch name (default: publisher-<timestamp>)
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Prune orphaned remote files from each target's managed subtree
    Prune {
        /// Working branch name (default: publisher-<timestamp>)
        #[arg(short, long)]
        branch: Option<String>,
    },
}

/// On-disk configuration.
#[derive(Debug, Deserialize)]
struct AppConfig {
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    token_env: String,
    /// Alternate API base for GitHub Enterprise hosts.
    #[serde(default)]
    api_base: Option<String>,
    upload: PruneConfig,
    targets: Vec<RepoTarget>,
    /// Currently shared files, as `remote_path` plus the owning target.
    #[serde(default)]
    shared: Vec<SharedEntry>,
}

#[derive(Debug, Deserialize)]
struct SharedEntry {
    remote_path: String,
    owner: String,
    repo: String,
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl AppConfig {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        if config.targets.is_empty() {
            bail!("no targets configured in {}", path.display());
        }
        Ok(config)
    }

    /// Resolve the shared-file entries against the configured targets.
    fn managed_refs(&self) -> Result<Vec<ManagedFileRef>> {
        self.shared
            .iter()
            .map(|entry| {
                let target = self
                    .targets
                    .iter()
                    .find(|t| t.owner == entry.owner && t.repo == entry.repo)
                    .with_context(|| {
                        format!(
                            "shared file {} references unknown target {}/{}",
                            entry.remote_path, entry.owner, entry.repo
                        )
                    })?;
                Ok(ManagedFileRef {
                    remote_path: entry.remote_path.clone(),
                    target: target.clone(),
                })
            })
            .collect()
    }
}

fn working_branch_name(requested: Option<String>) -> String {
    requested.unwrap_or_else(|| {
        format!("publisher-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let config = AppConfig::load(&cli.config)?;
    let token = std::env::var(&config.token_env).ok();
    if token.is_none() {
        info!("{} is not set; using unauthenticated API access", config.token_env);
    }
    let client: Arc<dyn RemoteClient> = match &config.api_base {
        Some(base) => Arc::new(GithubRest::with_base(base, token)?),
        None => Arc::new(GithubRest::new(token)?),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    match cli.command {
        Commands::Check => {
            let validator = RepoValidator::new(client, notifier);
            let report = validator.check_repositories(&config.targets, false).await;
            if !report.is_valid() {
                bail!("{} target(s) failed validation", report.issues.len());
            }
            info!("all {} target(s) are valid", config.targets.len());
        }
        Commands::Update { branch } => {
            let branch = working_branch_name(branch);
            run_update(&branch, &config, client, notifier).await?;
        }
        Commands::Prune { branch } => {
            let branch = working_branch_name(branch);
            let branches = BranchLifecycleManager::new(Arc::clone(&client), Arc::clone(&notifier));
            if !branches.new_branch(&branch, &config.targets).await {
                bail!("could not derive working branch {branch} on every target");
            }

            let reconciler = FileReconciler::new(Arc::clone(&client), Arc::clone(&notifier));
            let shared = config.managed_refs()?;
            let outcome = reconciler
                .prune_repos(&branch, &config.targets, &shared, &config.upload)
                .await;
            info!(
                "prune finished: {} deleted, {} failed",
                outcome.deleted.len(),
                outcome.undeleted.len()
            );

            run_update(&branch, &config, client, notifier).await?;
            if !outcome.success {
                bail!("some files could not be pruned");
            }
        }
    }
    Ok(())
}

async fn run_update(
    branch: &str,
    config: &AppConfig,
    client: Arc<dyn RemoteClient>,
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    let branches = BranchLifecycleManager::new(Arc::clone(&client), Arc::clone(&notifier));
    if !branches.new_branch(branch, &config.targets).await {
        bail!("could not derive working branch {branch} on every target");
    }
    let coordinator = PullRequestCoordinator::new(client, notifier);
    if !coordinator.update_repository(branch, &config.targets).await {
        bail!("every target failed to update");
    }
    info!("update finished on branch {branch}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
token_env = "GH_TOKEN"

[upload]
behavior = "local-tree"
default_folder = "docs"
attachment_folder = "docs/img"
rate_limit = 50
folder_index_name = "index.md"

[[targets]]
owner = "me"
repo = "site"
base_branch = "main"
auto_merge = true
auto_clean = true

[[shared]]
remote_path = "docs/index.md"
owner = "me"
repo = "site"
"#;

    #[test]
    fn config_parses_and_resolves_shared_refs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.token_env, "GH_TOKEN");
        assert_eq!(config.targets.len(), 1);
        assert!(config.targets[0].auto_merge);
        let refs = config.managed_refs().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target.repo, "site");
    }

    #[test]
    fn shared_ref_to_unknown_target_is_rejected() {
        let broken = format!(
            "{CONFIG}\n[[shared]]\nremote_path = \"x.md\"\nowner = \"me\"\nrepo = \"ghost\"\n"
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(broken.as_bytes()).unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.managed_refs().is_err());
    }

    #[test]
    fn empty_target_list_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[upload]\nbehavior = \"local-tree\"\ndefault_folder = \"docs\"\n")
            .unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn working_branch_name_uses_override() {
        assert_eq!(working_branch_name(Some("pub-x".to_string())), "pub-x");
        assert!(working_branch_name(None).starts_with("publisher-"));
    }
}
