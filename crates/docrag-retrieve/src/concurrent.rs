//! Multi-document retrieval with per-document searches fanned out to the
//! blocking pool, under an optional overall deadline.

use std::sync::Arc;
use std::time::Duration;

use docrag_core::error::{Error, Result};
use docrag_core::types::RetrievedPassage;
use tokio::time::Instant;

use crate::engine::RetrievalEngine;
use crate::retrieve::{merge_ranked, skip_on_error, unique_doc_ids};

impl RetrievalEngine {
    /// Same ranking as `retrieve_multi`, with documents searched in parallel.
    ///
    /// A document that has not finished when `deadline` elapses is skipped like
    /// any other per-document failure. Falls back to the configured
    /// `retrieval.deadline_ms` when `deadline` is `None`.
    ///
    /// A search that misses the deadline is abandoned, not cancelled: its
    /// blocking task runs to completion on the blocking pool and its result is
    /// dropped.
    pub async fn retrieve_multi_concurrent<S: AsRef<str>>(
        &self,
        doc_ids: &[S],
        query: &str,
        top_k: usize,
        deadline: Option<Duration>,
    ) -> Result<Vec<RetrievedPassage>> {
        let doc_ids = unique_doc_ids(doc_ids)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let deadline = deadline.or(self.retrieval.deadline_ms.map(Duration::from_millis));
        let deadline_at = deadline.map(|d| Instant::now() + d);

        let engine = self.clone();
        let query = query.to_string();
        let query_vec = tokio::task::spawn_blocking(move || engine.embed_query(&query))
            .await
            .map_err(|e| Error::Embedding(format!("query embedding task failed: {e}")))??;
        let query_vec = Arc::new(query_vec);
        let candidates = self.candidates_per_document(top_k);

        let searches = doc_ids.iter().map(|doc_id| {
            let engine = self.clone();
            let doc_id = doc_id.clone();
            let query_vec = Arc::clone(&query_vec);
            async move {
                let task_doc = doc_id.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    engine.search_document(&task_doc, &query_vec, candidates)
                });
                let joined = match deadline_at {
                    Some(at) => match tokio::time::timeout_at(at, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            tracing::warn!(doc_id = %doc_id, "skipping document that missed the deadline");
                            return None;
                        }
                    },
                    None => handle.await,
                };
                match joined {
                    Ok(result) => skip_on_error(&doc_id, result),
                    Err(e) => {
                        tracing::warn!(doc_id = %doc_id, error = %e, "search task failed");
                        None
                    }
                }
            }
        });
        let per_doc = futures::future::join_all(searches).await;
        Ok(merge_ranked(per_doc, top_k))
    }
}
