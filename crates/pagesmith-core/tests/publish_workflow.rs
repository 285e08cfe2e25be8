//! End-to-end publish workflow: validation, working-branch derivation,
//! pull-request coordination, and multi-repo aggregation.

use std::sync::Arc;

use pagesmith_core::remote::fakes::MemoryRemote;
use pagesmith_core::{
    BranchLifecycleManager, BranchOutcome, PullRequestCoordinator, RecordingNotifier, RepoTarget,
    RepoValidator,
};

fn target(owner: &str, repo: &str, auto_merge: bool) -> RepoTarget {
    RepoTarget {
        owner: owner.to_string(),
        repo: repo.to_string(),
        base_branch: "main".to_string(),
        commit_msg: String::new(),
        auto_merge,
        auto_clean: false,
    }
}

#[tokio::test]
async fn branch_creation_is_idempotent_against_unchanged_base() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_branch("a", "b", "main", "sha-0");
    let notifier = Arc::new(RecordingNotifier::new());
    let branches = BranchLifecycleManager::new(remote.clone(), notifier);
    let repo = target("a", "b", false);

    assert_eq!(
        branches.new_branch_on_repo("pub-1", &repo).await,
        BranchOutcome::Created
    );
    assert_eq!(
        branches.new_branch_on_repo("pub-1", &repo).await,
        BranchOutcome::AlreadyExists
    );

    let names = remote.branch_names("a", "b");
    assert_eq!(names.iter().filter(|n| n.as_str() == "pub-1").count(), 1);
}

#[tokio::test]
async fn full_update_merges_and_cleans_up_the_working_branch() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_branch("a", "site", "main", "sha-0");
    let notifier = Arc::new(RecordingNotifier::new());

    let validator = RepoValidator::new(remote.clone(), notifier.clone());
    let report = validator
        .check_repositories(&[target("a", "site", true)], true)
        .await;
    assert!(report.is_valid());

    let branches = BranchLifecycleManager::new(remote.clone(), notifier.clone());
    assert!(branches.new_branch("pub-1", &[target("a", "site", true)]).await);

    // Content push happens here in the real pipeline, owned elsewhere.

    let prs = PullRequestCoordinator::new(remote.clone(), notifier);
    let ok = prs
        .update_repository("pub-1", &[target("a", "site", true)])
        .await;
    assert!(ok);
    assert!(!remote.branch_names("a", "site").contains(&"pub-1".to_string()));
    assert!(remote.open_pr_numbers("a", "site").is_empty());
}

#[tokio::test]
async fn update_over_mixed_targets_succeeds_when_any_target_succeeds() {
    let remote = Arc::new(MemoryRemote::new());
    // "bad" never got a working branch; its PR creation fails.
    remote.add_branch("a", "bad", "main", "sha-0");
    remote.add_branch("a", "good", "main", "sha-0");
    remote.add_branch("a", "good", "pub-1", "sha-0");
    let notifier = Arc::new(RecordingNotifier::new());
    let prs = PullRequestCoordinator::new(remote, notifier);

    let ok = prs
        .update_repository("pub-1", &[target("a", "bad", false), target("a", "good", false)])
        .await;
    assert!(ok, "partial multi-repo failure is not a full failure");
}

#[tokio::test]
async fn update_over_all_failing_targets_fails() {
    let remote = Arc::new(MemoryRemote::new());
    remote.add_branch("a", "x", "main", "sha-0");
    remote.add_branch("a", "y", "main", "sha-0");
    let notifier = Arc::new(RecordingNotifier::new());
    let prs = PullRequestCoordinator::new(remote, notifier);

    let ok = prs
        .update_repository("pub-1", &[target("a", "x", false), target("a", "y", false)])
        .await;
    assert!(!ok);
}
