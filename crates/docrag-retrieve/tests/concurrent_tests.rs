mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{engine, seed, SlowBlobStore, TableEmbedder};
use docrag_core::traits::BlobStore;
use docrag_vector::MemoryBlobStore;

fn table() -> Arc<TableEmbedder> {
    Arc::new(TableEmbedder::new(&[
        ("q", [0.0, 0.0]),
        ("one", [0.1, 0.0]),
        ("two", [0.2, 0.0]),
        ("three", [0.3, 0.0]),
        ("four", [0.4, 0.0]),
    ]))
}

#[tokio::test]
async fn concurrent_matches_sequential() {
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let embedder = table();
    seed(blobs.clone(), embedder.as_ref(), &[("A", &["four", "one"]), ("B", &["three"]), ("C", &["two"])]);
    let engine = engine(blobs, embedder);
    let docs = ["A", "B", "C", "missing"];

    let sequential = engine.retrieve_multi(&docs, "q", 3).unwrap();
    let concurrent = engine.retrieve_multi_concurrent(&docs, "q", 3, None).await.unwrap();
    assert_eq!(sequential, concurrent);
    let texts: Vec<&str> = concurrent.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn documents_missing_the_deadline_are_skipped() {
    let blobs = Arc::new(SlowBlobStore {
        inner: MemoryBlobStore::new(),
        slow_prefix: "slow/".to_string(),
        delay: Duration::from_millis(1500),
    });
    let embedder = table();
    seed(blobs.clone(), embedder.as_ref(), &[("fast", &["two"]), ("slow", &["one"])]);
    let engine = engine(blobs, embedder);

    let started = Instant::now();
    let results = engine
        .retrieve_multi_concurrent(&["fast", "slow"], "q", 5, Some(Duration::from_millis(300)))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(1400));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, "fast");
}
