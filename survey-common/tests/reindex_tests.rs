//! Concurrent reindex behavior
//!
//! Many submission tasks update the same manifest at once; every update must
//! land and the three manifest lists must stay aligned.

use std::collections::HashSet;
use std::sync::Arc;
use survey_common::manifest::{SAVE_MODE, SNAPSHOT_MODE};
use survey_common::{ManifestIndex, Reindexer, ResultData, SubmissionStore, UpsertOutcome};

fn setup(tags: &[&str]) -> (tempfile::TempDir, Arc<Reindexer>) {
    let dir = tempfile::tempdir().unwrap();
    for tag in tags {
        std::fs::create_dir_all(dir.path().join(tag)).unwrap();
    }
    let reindexer = Arc::new(Reindexer::new(dir.path()));
    (dir, reindexer)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients_each_get_one_entry() {
    let (_dir, reindexer) = setup(&["run"]);

    let handles: Vec<_> = (0..64)
        .map(|i| {
            reindexer.spawn_upsert(
                "run".to_string(),
                format!("client-{}", i),
                format!("file-{}", i),
                SNAPSHOT_MODE.to_string(),
            )
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some(UpsertOutcome::Appended));
    }

    let manifest = reindexer.snapshot("run").await.unwrap();
    assert!(manifest.check().is_ok());
    assert_eq!(manifest.len(), 64);
    let unique: HashSet<_> = manifest.clients.iter().collect();
    assert_eq!(unique.len(), 64);
    for entry in manifest.entries() {
        let suffix = entry.client.trim_start_matches("client-");
        assert_eq!(entry.file, format!("file-{}", suffix));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_for_one_client_keep_single_entry() {
    let (_dir, reindexer) = setup(&["run"]);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            reindexer.spawn_upsert(
                "run".to_string(),
                "same-client".to_string(),
                format!("file-{}", i),
                SNAPSHOT_MODE.to_string(),
            )
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    let manifest = reindexer.snapshot("run").await.unwrap();
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.clients, vec!["same-client"]);
    assert!(manifest.files[0].starts_with("file-"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_save_is_never_replaced_by_later_snapshots() {
    let (_dir, reindexer) = setup(&["run"]);

    reindexer.upsert("run", "c1", "final", SAVE_MODE).await;
    let handles: Vec<_> = (0..16)
        .map(|i| {
            reindexer.spawn_upsert(
                "run".to_string(),
                "c1".to_string(),
                format!("late-{}", i),
                SNAPSHOT_MODE.to_string(),
            )
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some(UpsertOutcome::Kept));
    }

    let manifest = reindexer.snapshot("run").await.unwrap();
    assert_eq!(manifest.files, vec!["final"]);
    assert_eq!(manifest.modes, vec!["save"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tags_use_independent_manifests() {
    let (_dir, reindexer) = setup(&["alpha", "beta"]);

    let a = reindexer.spawn_upsert("alpha".into(), "c1".into(), "fa".into(), SAVE_MODE.into());
    let b = reindexer.spawn_upsert("beta".into(), "c1".into(), "fb".into(), SNAPSHOT_MODE.into());
    a.await.unwrap();
    b.await.unwrap();

    let alpha = ManifestIndex::load(&reindexer.manifest_path("alpha")).unwrap();
    let beta = ManifestIndex::load(&reindexer.manifest_path("beta")).unwrap();
    assert_eq!(alpha.files, vec!["fa"]);
    assert_eq!(beta.files, vec!["fb"]);
    assert_eq!(beta.modes, vec!["snapshot"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_store_submissions_from_many_clients() {
    let (_dir, reindexer) = setup(&["run"]);
    let store = SubmissionStore::new(reindexer.clone(), "run").unwrap();

    let mut tasks = Vec::new();
    for i in 0..12 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let mut data = ResultData::default();
            data.set("0", vec![format!("answer {}", i)]);
            let saved = store
                .save(data, SNAPSHOT_MODE, &format!("10.0.0.{}", i), "sess")
                .await
                .unwrap();
            saved.reindex.await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), Some(UpsertOutcome::Appended));
    }

    let manifest = reindexer.snapshot("run").await.unwrap();
    assert_eq!(manifest.len(), 12);
    for entry in manifest.entries() {
        let path = store.directory().join(format!("{}.json", entry.file));
        assert!(path.exists(), "manifest points at missing file {}", entry.file);
    }
}
