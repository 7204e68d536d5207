use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use docrag_core::traits::Embedder;
use docrag_core::Error;
use docrag_embed::HashingEmbedder;
use docrag_vector::VectorIndex;

/// Returns a fixed vector per known text and counts batch calls.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    drop_last: bool,
}

impl TableEmbedder {
    fn new(entries: &[(&str, [f32; 2])]) -> Self {
        let table = entries.iter().map(|(t, v)| (t.to_string(), v.to_vec())).collect();
        Self { table, calls: AtomicUsize::new(0), drop_last: false }
    }
}

impl Embedder for TableEmbedder {
    fn model_id(&self) -> &str { "table:d2" }
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut out = texts
            .iter()
            .map(|t| self.table.get(t).cloned().ok_or_else(|| anyhow::anyhow!("unknown text {t}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if self.drop_last { out.pop(); }
        Ok(out)
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn build_embeds_once_and_keeps_order() {
    let embedder = TableEmbedder::new(&[("a", [0.0, 0.0]), ("b", [1.0, 0.0]), ("c", [2.0, 0.0])]);
    let index = VectorIndex::build(texts(&["c", "a", "b"]), &embedder).expect("build");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(index.chunk_texts(), &texts(&["c", "a", "b"])[..]);
    assert_eq!(index.vectors()[0], vec![2.0, 0.0]);
    assert_eq!(index.vectors()[1], vec![0.0, 0.0]);
    assert_eq!(index.model_id(), "table:d2");
}

#[test]
fn search_ranks_by_ascending_distance() {
    // Distances from the origin: 0.01, 0.25, 1.0
    let embedder = TableEmbedder::new(&[("near", [0.1, 0.0]), ("mid", [0.0, 0.5]), ("far", [1.0, 0.0])]);
    let index = VectorIndex::build(texts(&["near", "mid", "far"]), &embedder).unwrap();
    let hits = index.search(&[0.0, 0.0], 2).unwrap();
    let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert!((hits[0].distance - 0.01).abs() < 1e-6);
    assert!((hits[1].distance - 0.25).abs() < 1e-6);
}

#[test]
fn top_k_larger_than_index_returns_everything() {
    let embedder = TableEmbedder::new(&[("x", [3.0, 0.0]), ("y", [1.0, 0.0])]);
    let index = VectorIndex::build(texts(&["x", "y"]), &embedder).unwrap();
    let hits = index.search(&[0.0, 0.0], 50).unwrap();
    assert_eq!(hits.iter().map(|h| h.position).collect::<Vec<_>>(), vec![1, 0]);
}

#[test]
fn mismatched_vector_count_is_an_embedding_error() {
    let mut embedder = TableEmbedder::new(&[("a", [0.0, 0.0]), ("b", [1.0, 0.0])]);
    embedder.drop_last = true;
    let res = VectorIndex::build(texts(&["a", "b"]), &embedder);
    assert!(matches!(res, Err(Error::Embedding(_))));
}

#[test]
fn failing_embedder_is_an_embedding_error() {
    let embedder = TableEmbedder::new(&[]);
    let res = VectorIndex::build(texts(&["unknown"]), &embedder);
    assert!(matches!(res, Err(Error::Embedding(_))));
}

#[test]
fn query_with_wrong_dimension_is_rejected() {
    let embedder = TableEmbedder::new(&[("a", [0.0, 0.0])]);
    let index = VectorIndex::build(texts(&["a"]), &embedder).unwrap();
    let res = index.search(&[0.0, 0.0, 0.0], 1);
    assert!(matches!(res, Err(Error::DimensionMismatch { expected: 2, actual: 3 })));
}

#[test]
fn empty_chunk_list_builds_empty_index_without_embedding() {
    let embedder = TableEmbedder::new(&[]);
    let index = VectorIndex::build(Vec::new(), &embedder).unwrap();
    assert!(index.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(index.search(&[0.0, 0.0], 5).unwrap().is_empty());
}

#[test]
fn repeated_search_is_deterministic() {
    let embedder = HashingEmbedder::new(128);
    let chunks = texts(&[
        "plants use photosynthesis to make sugar",
        "the mitochondria is the powerhouse of the cell",
        "photosynthesis happens in chloroplasts",
        "cell walls are made of cellulose",
    ]);
    let index = VectorIndex::build(chunks, &embedder).unwrap();
    let q = embedder.embed_batch(&["photosynthesis".to_string()]).unwrap().remove(0);
    let first = index.search(&q, 3).unwrap();
    let second = index.search(&q, 3).unwrap();
    assert_eq!(first, second);
    assert_eq!(index.chunk(first[0].position).map(|c| c.position), Some(first[0].position));
}
