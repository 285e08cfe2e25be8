//! Prune safety properties: mapping protection, cross-target pruning,
//! exclusions, the front-matter veto, and quota gating.

use std::sync::Arc;

use pagesmith_core::remote::fakes::MemoryRemote;
use pagesmith_core::{
    DeletionOutcome, FileReconciler, ManagedFileRef, MonoRepoContext, PruneConfig,
    RecordingNotifier, RepoTarget, UploadBehavior,
};

fn target(owner: &str, repo: &str) -> RepoTarget {
    RepoTarget {
        owner: owner.to_string(),
        repo: repo.to_string(),
        base_branch: "main".to_string(),
        commit_msg: String::new(),
        auto_merge: false,
        auto_clean: true,
    }
}

fn config() -> PruneConfig {
    PruneConfig {
        behavior: UploadBehavior::LocalTree,
        root_folder: String::new(),
        default_folder: "docs".to_string(),
        attachment_folder: "docs/img".to_string(),
        exclusions: vec![],
        rate_limit: 100,
        folder_index_name: "index.md".to_string(),
    }
}

fn mapped(path: &str, target: &RepoTarget) -> ManagedFileRef {
    ManagedFileRef {
        remote_path: path.to_string(),
        target: target.clone(),
    }
}

fn reconciler(remote: Arc<MemoryRemote>) -> (FileReconciler, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (FileReconciler::new(remote, notifier.clone()), notifier)
}

#[tokio::test]
async fn prune_scenario_with_index_veto() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file(
        "a",
        "b",
        "docs/index.md",
        "sha-idx",
        "---\nshare: true\nindex: true\n---\n# Landing\n",
    );
    remote.add_file("a", "b", "docs/old.md", "sha-old", "---\nshare: true\n---\nstale");
    remote.add_file("a", "b", "docs/img/pic.png", "sha-pic", "\u{89}PNG");

    let here = target("a", "b");
    let context = MonoRepoContext::new(here.clone(), vec![mapped("docs/index.md", &here)]);
    let (reconciler, notifier) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert_eq!(outcome.deleted, vec!["docs/old.md", "docs/img/pic.png"]);
    assert!(outcome.undeleted.is_empty());
    assert!(outcome.success);
    assert!(remote.file_paths("a", "b").contains(&"docs/index.md".to_string()));
    assert!(notifier.contains("pruned 2 file(s)"));
}

#[tokio::test]
async fn unmapped_index_file_is_still_protected_by_its_front_matter() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file(
        "a",
        "b",
        "docs/guides/index.md",
        "sha-idx",
        "---\nshare: true\nindex: true\n---\n",
    );
    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert!(outcome.deleted.is_empty());
    assert!(outcome.success);
    assert_eq!(remote.file_paths("a", "b").len(), 1);
}

#[tokio::test]
async fn mapped_paths_for_the_same_target_are_never_deleted() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/kept.md", "sha-1", "---\nshare: true\n---\n");
    remote.add_file("a", "b", "docs/img/kept.png", "sha-2", "png");

    let here = target("a", "b");
    let context = MonoRepoContext::new(
        here.clone(),
        vec![mapped("docs/kept.md", &here), mapped("docs/img/kept.png", &here)],
    );
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert_eq!(outcome, DeletionOutcome::noop());
    assert_eq!(remote.file_paths("a", "b").len(), 2);
}

#[tokio::test]
async fn empty_index_convention_disables_the_veto() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file(
        "a",
        "b",
        "docs/index.md",
        "sha-idx",
        "---\nshare: true\nindex: true\n---\n",
    );

    let mut cfg = config();
    cfg.folder_index_name = String::new();
    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    // Without a naming convention no candidate is treated as an index
    // file, so the front matter is never consulted.
    let outcome = reconciler.prune_repo("pub-1", &context, &cfg).await;
    assert_eq!(outcome.deleted, vec!["docs/index.md"]);
    assert!(remote.file_paths("a", "b").is_empty());
}

#[tokio::test]
async fn markdown_mapped_to_another_target_is_pruned_here() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/moved.md", "sha-1", "---\nshare: true\n---\n");

    let context = MonoRepoContext::new(
        target("a", "b"),
        vec![mapped("docs/moved.md", &target("a", "other"))],
    );
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert_eq!(outcome.deleted, vec!["docs/moved.md"]);
    assert!(remote.file_paths("a", "b").is_empty());
}

#[tokio::test]
async fn excluded_candidates_are_never_deleted() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/archive/old.md", "sha-1", "stale");
    remote.add_file("a", "b", "docs/junk.md", "sha-2", "stale");

    let mut cfg = config();
    cfg.exclusions = vec!["/archive//".to_string()];
    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &cfg).await;
    assert_eq!(outcome.deleted, vec!["docs/junk.md"]);
    assert!(remote.file_paths("a", "b").contains(&"docs/archive/old.md".to_string()));
}

#[tokio::test]
async fn exhausted_quota_aborts_before_any_delete_call() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/one.md", "sha-1", "x");
    remote.add_file("a", "b", "docs/two.md", "sha-2", "x");
    remote.set_quota(0);

    let mut cfg = config();
    cfg.rate_limit = 0; // always verify remaining quota
    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, notifier) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &cfg).await;
    assert_eq!(outcome, DeletionOutcome::aborted());
    assert_eq!(remote.delete_calls(), 0, "no partial deletions");
    assert!(notifier.contains("quota"));
}

#[tokio::test]
async fn candidate_count_over_limit_verifies_quota() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/one.md", "sha-1", "x");
    remote.add_file("a", "b", "docs/two.md", "sha-2", "x");
    remote.set_quota(0);

    let mut cfg = config();
    cfg.rate_limit = 1; // 2 candidates > 1
    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &cfg).await;
    assert!(!outcome.success);
    assert_eq!(remote.delete_calls(), 0);
}

#[tokio::test]
async fn autoclean_disabled_is_a_successful_noop() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/old.md", "sha-1", "x");

    let mut disabled = target("a", "b");
    disabled.auto_clean = false;
    let context = MonoRepoContext::new(disabled, vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert_eq!(outcome, DeletionOutcome::noop());
    assert_eq!(remote.delete_calls(), 0);
}

#[tokio::test]
async fn failed_deletes_accumulate_and_fail_the_outcome() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/stuck.md", "sha-1", "x");
    remote.add_file("a", "b", "docs/gone.md", "sha-2", "x");
    remote.fail_delete_of("docs/stuck.md");

    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, notifier) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    assert_eq!(outcome.deleted, vec!["docs/gone.md"]);
    assert_eq!(outcome.undeleted, vec!["docs/stuck.md"]);
    assert!(!outcome.success);
    assert!(notifier.contains("1 failed"));
}

#[tokio::test]
async fn cancelled_delete_is_a_silent_noop() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "b", "docs/aborted.md", "sha-1", "x");
    remote.add_file("a", "b", "docs/gone.md", "sha-2", "x");
    remote.cancel_delete_of("docs/aborted.md");

    let context = MonoRepoContext::new(target("a", "b"), vec![]);
    let (reconciler, _) = reconciler(remote.clone());

    let outcome = reconciler.prune_repo("pub-1", &context, &config()).await;
    // The aborted path counts neither as deleted nor as failed.
    assert_eq!(outcome.deleted, vec!["docs/gone.md"]);
    assert!(outcome.undeleted.is_empty());
    assert!(outcome.success);
}

#[tokio::test]
async fn prune_repos_processes_every_target_and_returns_the_first_outcome() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_file("a", "first", "docs/old.md", "sha-1", "x");
    remote.add_file("a", "second", "docs/old.md", "sha-2", "x");

    let (reconciler, _) = reconciler(remote.clone());
    let outcome = reconciler
        .prune_repos(
            "pub-1",
            &[target("a", "first"), target("a", "second")],
            &[],
            &config(),
        )
        .await;

    // Only the first target's outcome is returned, but both were pruned.
    assert_eq!(outcome.deleted, vec!["docs/old.md"]);
    assert!(remote.file_paths("a", "first").is_empty());
    assert!(remote.file_paths("a", "second").is_empty());
}
