//! Turning retrieved passages into prompt context for the language model.

use docrag_core::error::Result;

use crate::engine::RetrievalEngine;

/// What the caller wants to produce from the retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Chat,
    MindMap,
    Quiz,
    Summary,
}

impl Purpose {
    pub fn default_top_k(self) -> usize {
        match self {
            Purpose::Chat => 5,
            Purpose::MindMap => 10,
            Purpose::Quiz => 15,
            Purpose::Summary => 20,
        }
    }

    /// Quizzes and summaries cover the whole document, so they ignore the
    /// user's text and search with a fixed query.
    pub fn retrieval_query(self, user_query: &str) -> &str {
        match self {
            Purpose::Chat | Purpose::MindMap => user_query,
            Purpose::Quiz => "Generate a quiz based on the key concepts in this document.",
            Purpose::Summary => "Provide a comprehensive summary of this document.",
        }
    }
}

impl std::str::FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(Purpose::Chat),
            "mindmap" | "mind-map" => Ok(Purpose::MindMap),
            "quiz" => Ok(Purpose::Quiz),
            "summary" | "summarize" => Ok(Purpose::Summary),
            other => Err(format!("unknown purpose '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOutcome {
    Context(String),
    NoRelevantContext,
}

/// Join passages in ranked order, separated by a blank line.
pub fn build_context<S: AsRef<str>>(passages: &[S]) -> ContextOutcome {
    if passages.is_empty() {
        return ContextOutcome::NoRelevantContext;
    }
    let joined = passages.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n\n");
    ContextOutcome::Context(joined)
}

impl RetrievalEngine {
    pub fn context_for(&self, purpose: Purpose, doc_id: &str, user_query: &str) -> Result<ContextOutcome> {
        let passages = self.retrieve_single(doc_id, purpose.retrieval_query(user_query), purpose.default_top_k())?;
        Ok(build_context(&passages))
    }

    pub fn context_for_many<S: AsRef<str>>(&self, purpose: Purpose, doc_ids: &[S], user_query: &str) -> Result<ContextOutcome> {
        let passages = self.retrieve_multi(doc_ids, purpose.retrieval_query(user_query), purpose.default_top_k())?;
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        Ok(build_context(&texts))
    }
}
