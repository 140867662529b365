//! Locking behaviour seen through the engine

use skillsync_core::{
    ArtifactId, Direction, Error, Project, ResolutionStrategy, RollbackMode, Scope, SyncConfig,
    SyncEngine,
};
use skillsync_fs::{LockKey, OperationLock};
use skillsync_test_utils::TestWorkspace;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn engine(ws: &TestWorkspace, lock_timeout_ms: u64) -> SyncEngine {
    let config = SyncConfig {
        lock_timeout_ms,
        ..SyncConfig::with_store_dir(ws.store_dir())
    };
    SyncEngine::new(
        config,
        Scope::collection("default", ws.collection_dir()).unwrap(),
    )
}

#[test]
fn held_pair_lock_is_reported_as_retryable_contention() {
    let ws = TestWorkspace::new();
    ws.add_collection_skill("review");
    let engine = engine(&ws, 100);
    let project = Project::new("web", ws.project_dir("web")).unwrap();
    let review = ArtifactId::skill("review").unwrap();

    let held = OperationLock::acquire(
        &engine.config().locks_dir(),
        LockKey::pair("default", "web"),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = engine.deploy(&project, &review, None).unwrap_err();
    assert!(
        matches!(err, Error::Fs(skillsync_fs::Error::LockContention { .. })),
        "unexpected error: {err}"
    );
    assert!(err.is_retryable());
    ws.assert_file_not_exists("projects/web/.claude/skills/review");

    drop(held);
    engine.deploy(&project, &review, None).unwrap();
    ws.assert_file_exists("projects/web/.claude/skills/review/SKILL.md");
}

#[test]
fn different_projects_do_not_block_each_other() {
    let ws = Arc::new(TestWorkspace::new());
    ws.add_collection_skill("review");
    let engine = Arc::new(engine(&ws, 2_000));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ws = ws.clone();
            let engine = engine.clone();
            thread::spawn(move || {
                let name = format!("project-{i}");
                let project = Project::new(name.clone(), ws.project_dir(&name)).unwrap();
                let review = ArtifactId::skill("review").unwrap();
                engine.deploy(&project, &review, None).map(|_| project)
            })
        })
        .collect();

    for handle in handles {
        let project = handle.join().unwrap().unwrap();
        let review = ArtifactId::skill("review").unwrap();
        assert!(engine.detect_drift(&project, &review).unwrap().is_clean());
    }
}

#[test]
fn same_project_operations_are_serialized() {
    let ws = Arc::new(TestWorkspace::new());
    ws.add_collection_skill("review");
    ws.add_collection_skill("lint");
    let engine = Arc::new(engine(&ws, 5_000));
    let project = Project::new("web", ws.project_dir("web")).unwrap();

    let handles: Vec<_> = ["review", "lint"]
        .into_iter()
        .map(|name| {
            let engine = engine.clone();
            let project = project.clone();
            thread::spawn(move || {
                let artifact = ArtifactId::skill(name).unwrap();
                engine.deploy(&project, &artifact, None)
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // Neither ledger update was lost
    let mut names: Vec<_> = engine
        .list_deployments(&project)
        .unwrap()
        .into_iter()
        .map(|r| r.artifact_name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["lint", "review"]);
}

#[test]
fn collection_writes_wait_for_the_collection_lock() {
    let ws = TestWorkspace::new();
    ws.add_collection_skill("review");
    let engine = engine(&ws, 100);
    let project = Project::new("web", ws.project_dir("web")).unwrap();
    let review = ArtifactId::skill("review").unwrap();
    engine.deploy(&project, &review, None).unwrap();
    ws.write_project_skill("web", "review", &[("SKILL.md", "# review\n\nlocal\n")]);
    let collection_before = ws.read("collection/skills/review/SKILL.md");

    // Held by a collection-wide snapshot or rollback
    let held = OperationLock::acquire(
        &engine.config().locks_dir(),
        LockKey::collection("default"),
        Duration::from_millis(100),
    )
    .unwrap();

    for strategy in [
        ResolutionStrategy::Overwrite {
            direction: Direction::ProjectToCollection,
        },
        ResolutionStrategy::Fork {
            new_name: "review-local".into(),
        },
    ] {
        let err = engine.resolve(&project, &review, strategy).unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
    }
    assert_eq!(ws.read("collection/skills/review/SKILL.md"), collection_before);
    ws.assert_file_not_exists("collection/skills/review-local");

    // Project-only writes do not need it
    engine
        .resolve(
            &project,
            &review,
            ResolutionStrategy::Overwrite {
                direction: Direction::CollectionToProject,
            },
        )
        .unwrap();

    drop(held);
    ws.write_project_skill("web", "review", &[("SKILL.md", "# review\n\nlocal\n")]);
    engine
        .resolve(
            &project,
            &review,
            ResolutionStrategy::Overwrite {
                direction: Direction::ProjectToCollection,
            },
        )
        .unwrap();
    ws.assert_file_contains("collection/skills/review/SKILL.md", "local");
}

#[test]
fn collection_rollback_waits_for_a_pull_in_progress() {
    let ws = TestWorkspace::new();
    ws.add_collection_skill("review");
    let engine = engine(&ws, 100);
    let snapshot = engine.create_snapshot("baseline").unwrap();

    // A pull into the collection holds the collection lock first
    let held = OperationLock::acquire(
        &engine.config().locks_dir(),
        LockKey::collection("default"),
        Duration::from_millis(100),
    )
    .unwrap();
    let err = engine
        .rollback(snapshot.id.as_str(), RollbackMode::Simple)
        .unwrap_err();
    assert!(
        matches!(err, Error::Fs(skillsync_fs::Error::LockContention { .. })),
        "unexpected error: {err}"
    );

    drop(held);
    engine
        .rollback(snapshot.id.as_str(), RollbackMode::Simple)
        .unwrap();
}
