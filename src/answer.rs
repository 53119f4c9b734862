//! Question answering seam.
//!
//! The pipeline's output feeds a knowledge-base assistant; this trait keeps
//! the transport out of the capture crate so callers can plug in whatever
//! backend serves their corpus.

use anyhow::Result;

/// An answer plus the source documents it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Answers questions against a knowledge base. `model_provider` names the
/// backing model family so one backend can route between providers.
pub trait AnswerBackend: Send + Sync {
    fn answer_question(&self, question: &str, model_provider: &str) -> Result<Answer>;
}
