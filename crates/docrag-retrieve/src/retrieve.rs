//! Single- and multi-document query execution.

use docrag_core::error::{Error, Result};
use docrag_core::types::{DocId, RetrievedPassage};
use docrag_vector::VectorIndex;

use crate::engine::RetrievalEngine;

impl RetrievalEngine {
    /// Ranked chunk texts of `doc_id` for `query`.
    ///
    /// A document without a persisted index yields an empty list, not an error.
    pub fn retrieve_single(&self, doc_id: &str, query: &str, top_k: usize) -> Result<Vec<String>> {
        let index = match self.store.load(doc_id) {
            Ok(index) => index,
            Err(e) if e.is_not_found() => {
                tracing::debug!(doc_id, "no index for document");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        if top_k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(query)?;
        let passages = self.search_index(doc_id, &index, &query_vec, top_k)?;
        Ok(passages.into_iter().map(|p| p.text).collect())
    }

    /// Best passages for `query` across `doc_ids`, with source attribution.
    ///
    /// Each document contributes up to `top_k * candidate_multiplier`
    /// candidates. Documents whose index is missing or unreadable are skipped.
    /// The pool is ranked by distance and cut to `top_k`; an empty result means
    /// no document produced any candidate.
    pub fn retrieve_multi<S: AsRef<str>>(&self, doc_ids: &[S], query: &str, top_k: usize) -> Result<Vec<RetrievedPassage>> {
        let doc_ids = unique_doc_ids(doc_ids)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(query)?;
        let candidates = self.candidates_per_document(top_k);
        let per_doc: Vec<Option<Vec<RetrievedPassage>>> = doc_ids
            .iter()
            .map(|doc_id| skip_on_error(doc_id, self.search_document(doc_id, &query_vec, candidates)))
            .collect();
        Ok(merge_ranked(per_doc, top_k))
    }

    pub(crate) fn candidates_per_document(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.retrieval.candidate_multiplier)
    }

    pub(crate) fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::Embedding(format!("{e:#}")))?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(v), true) => Ok(v),
            _ => Err(Error::Embedding("expected exactly one query vector".to_string())),
        }
    }

    /// Load `doc_id` and return its `k` nearest passages.
    pub(crate) fn search_document(&self, doc_id: &str, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
        let index = self.store.load(doc_id)?;
        self.search_index(doc_id, &index, query_vec, k)
    }

    fn search_index(&self, doc_id: &str, index: &VectorIndex, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
        if index.model_id() != self.embedder.model_id() {
            return Err(Error::Configuration(format!(
                "document '{doc_id}' was embedded with '{}' but queries use '{}'",
                index.model_id(),
                self.embedder.model_id()
            )));
        }
        let hits = index.search(query_vec, k)?;
        let passages = hits
            .into_iter()
            .filter_map(|hit| {
                index.chunk_text(hit.position).map(|text| RetrievedPassage {
                    doc_id: doc_id.to_string(),
                    position: hit.position,
                    text: text.to_string(),
                    score: hit.distance,
                })
            })
            .collect();
        Ok(passages)
    }
}

/// Deduplicate while keeping first-seen order; the set must be non-empty.
pub(crate) fn unique_doc_ids<S: AsRef<str>>(doc_ids: &[S]) -> Result<Vec<DocId>> {
    let mut unique: Vec<DocId> = Vec::with_capacity(doc_ids.len());
    for id in doc_ids {
        let id = id.as_ref();
        if !unique.iter().any(|u| u == id) {
            unique.push(id.to_string());
        }
    }
    if unique.is_empty() {
        return Err(Error::Configuration("multi-document query needs at least one document id".to_string()));
    }
    Ok(unique)
}

pub(crate) fn skip_on_error(doc_id: &str, result: Result<Vec<RetrievedPassage>>) -> Option<Vec<RetrievedPassage>> {
    match result {
        Ok(passages) => Some(passages),
        Err(e) if e.is_not_found() => {
            tracing::info!(doc_id, "skipping document without index");
            None
        }
        Err(e) => {
            tracing::warn!(doc_id, error = %e, "skipping document after retrieval failure");
            None
        }
    }
}

/// Pool per-document candidates (given in request order) and keep the `top_k` best.
///
/// Ties on score fall back to request order, then chunk position, so the
/// output never depends on which document finished first.
pub(crate) fn merge_ranked(per_doc: Vec<Option<Vec<RetrievedPassage>>>, top_k: usize) -> Vec<RetrievedPassage> {
    let mut pool: Vec<(usize, RetrievedPassage)> = per_doc
        .into_iter()
        .enumerate()
        .filter_map(|(order, passages)| passages.map(|ps| (order, ps)))
        .flat_map(|(order, ps)| ps.into_iter().map(move |p| (order, p)))
        .collect();
    pool.sort_by(|(oa, a), (ob, b)| {
        a.score.total_cmp(&b.score).then(oa.cmp(ob)).then(a.position.cmp(&b.position))
    });
    pool.truncate(top_k);
    pool.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(doc: &str, position: usize, score: f32) -> RetrievedPassage {
        RetrievedPassage { doc_id: doc.to_string(), position, text: format!("{doc}:{position}"), score }
    }

    #[test]
    fn merge_orders_by_score_then_request_order() {
        let per_doc = vec![
            Some(vec![passage("a", 0, 0.3), passage("a", 1, 0.5)]),
            None,
            Some(vec![passage("c", 4, 0.3), passage("c", 0, 0.1)]),
        ];
        let merged = merge_ranked(per_doc, 3);
        let ids: Vec<String> = merged.iter().map(|p| p.text.clone()).collect();
        assert_eq!(ids, vec!["c:0", "a:0", "c:4"]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert!(merge_ranked(vec![None, None], 5).is_empty());
    }

    #[test]
    fn unique_doc_ids_keeps_first_occurrence() {
        assert_eq!(unique_doc_ids(&["b", "a", "b"]).unwrap(), vec!["b".to_string(), "a".to_string()]);
        let empty: [&str; 0] = [];
        assert!(matches!(unique_doc_ids(&empty), Err(Error::Configuration(_))));
    }
}
