//! End-to-end lifecycle of a collection shared by several projects
//!
//! Exercises the complete flow: config loading -> deploy -> local edits ->
//! drift report -> resolution -> snapshot -> rollback.

use pretty_assertions::assert_eq;
use skillsync_core::{
    ArtifactId, ArtifactType, DriftType, Project, Recommendation, ResolutionStrategy, RollbackMode,
    Scope, SyncConfig, SyncEngine,
};
use skillsync_test_utils::TestWorkspace;
use skillsync_test_utils::fixture::{fake_git_dir, read_files, write_files};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine_from_config_file(ws: &TestWorkspace) -> SyncEngine {
    let config_path = ws.root().join("skillsync.yaml");
    std::fs::write(
        &config_path,
        format!(
            "store_dir: {}\nlock_timeout_ms: 500\nfingerprint_workers: 2\n",
            ws.store_dir().display()
        ),
    )
    .unwrap();

    let config = SyncConfig::load_or_default(&config_path).unwrap();
    assert_eq!(config.store_dir, ws.store_dir());
    assert_eq!(config.fingerprint_workers, 2);

    SyncEngine::new(
        config,
        Scope::collection("team", ws.collection_dir()).unwrap(),
    )
}

#[test]
fn shared_collection_across_two_projects() {
    init_tracing();
    let ws = TestWorkspace::new();
    fake_git_dir(&ws.collection_dir());
    ws.add_collection_skill("review");
    ws.add_collection_skill("lint");
    write_files(
        &ws.collection_dir(),
        &[("hooks/pre-commit/hook.json", "{\"command\": \"lint\"}\n")],
    );
    let engine = engine_from_config_file(&ws);

    let review = ArtifactId::skill("review").unwrap();
    let lint = ArtifactId::skill("lint").unwrap();
    let hook = ArtifactId::new("pre-commit", ArtifactType::Hook).unwrap();
    let web = Project::new("web", ws.project_dir("web")).unwrap();
    let api = Project::new("api", ws.project_dir("api")).unwrap();

    for project in [&web, &api] {
        for artifact in [&review, &lint, &hook] {
            engine.deploy(project, artifact, Some("1.0.0")).unwrap();
        }
    }
    ws.assert_file_exists("projects/api/.claude/hooks/pre-commit/hook.json");

    // web improves review; upstream moves lint on
    ws.write_project_skill("web", "review", &[("SKILL.md", "# review\n\nBetter steps.\n")]);
    ws.write_collection_skill("lint", &[("SKILL.md", "# lint\n\nNew rules.\n")]);

    let report = |project: &Project| -> Vec<(String, DriftType)> {
        engine
            .detect_drift_all(project)
            .unwrap()
            .into_iter()
            .map(|d| (d.artifact.to_string(), d.drift_type))
            .collect()
    };
    assert_eq!(
        report(&web),
        vec![
            ("skill:lint".to_string(), DriftType::Outdated),
            ("hook:pre-commit".to_string(), DriftType::None),
            ("skill:review".to_string(), DriftType::Modified),
        ]
    );
    assert_eq!(
        report(&api),
        vec![
            ("skill:lint".to_string(), DriftType::Outdated),
            ("hook:pre-commit".to_string(), DriftType::None),
            ("skill:review".to_string(), DriftType::None),
        ]
    );

    // Apply every recommendation for web
    for drift in engine.detect_drift_all(&web).unwrap() {
        if let Some(strategy) = ResolutionStrategy::recommended_for(&drift) {
            engine.resolve(&web, &drift.artifact, strategy).unwrap();
        }
    }
    assert!(engine.detect_drift_all(&web).unwrap().iter().all(|d| d.is_clean()));

    // web's improvement now reaches api as an upstream change
    let api_review = engine.detect_drift(&api, &review).unwrap();
    assert_eq!(api_review.drift_type, DriftType::Outdated);
    assert_eq!(api_review.recommendation, Recommendation::DeployToProject);

    // Collection writes kept the repository marker
    ws.assert_file_exists("collection/.git/HEAD");
}

#[test]
fn snapshot_then_rollback_whole_collection() {
    init_tracing();
    let ws = TestWorkspace::new();
    ws.add_collection_skill("review");
    ws.add_collection_skill("lint");
    let engine = engine_from_config_file(&ws);
    let before = read_files(&ws.collection_dir());

    let snapshot = engine.create_snapshot("before cleanup").unwrap();
    assert_eq!(snapshot.artifact_count, 2);

    std::fs::remove_dir_all(ws.collection_skill_dir("lint")).unwrap();
    ws.write_collection_skill("review", &[("SKILL.md", "gutted\n")]);

    let result = engine
        .rollback(snapshot.id.as_str(), RollbackMode::Simple)
        .unwrap();
    assert_eq!(read_files(&ws.collection_dir()), before);
    assert_eq!(result.files_restored.len(), 3);

    // Roll forward again to the safety snapshot the rollback took
    engine
        .rollback(result.safety_snapshot.as_str(), RollbackMode::Simple)
        .unwrap();
    ws.assert_file_contains("collection/skills/review/SKILL.md", "gutted");
    ws.assert_file_not_exists("collection/skills/lint");

    let audit = engine.audit_entries().unwrap();
    assert_eq!(audit.len(), 2);
    assert!(audit.iter().all(|e| e.success));
    assert_eq!(
        audit[0].source_snapshot.as_deref(),
        Some(result.safety_snapshot.as_str())
    );
}

#[test]
fn remove_recommendation_is_carried_out_by_undeploy() {
    init_tracing();
    let ws = TestWorkspace::new();
    ws.add_collection_skill("legacy");
    let engine = engine_from_config_file(&ws);
    let project = Project::new("web", ws.project_dir("web")).unwrap();
    let legacy = ArtifactId::skill("legacy").unwrap();

    engine.deploy(&project, &legacy, None).unwrap();
    std::fs::remove_dir_all(ws.collection_skill_dir("legacy")).unwrap();

    let drift = engine.detect_drift(&project, &legacy).unwrap();
    assert_eq!(drift.recommendation, Recommendation::RemoveFromProject);
    assert_eq!(ResolutionStrategy::recommended_for(&drift), None);

    engine.undeploy(&project, &legacy).unwrap();
    ws.assert_file_not_exists("projects/web/.claude/skills/legacy");
    assert!(engine.detect_drift(&project, &legacy).unwrap().is_clean());
}
