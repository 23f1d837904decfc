use std::sync::Arc;

use ai_client::util::{decode_json, truncate_to_char_boundary};
use serde::Deserialize;
use tracing::warn;

use briefwire_common::{Article, Project};

use crate::traits::{ChatModel, TextEmbedder};

/// Bytes of article body given to the adjudicator.
const BODY_PREVIEW_BYTES: usize = 1200;

/// Confidence recorded when the adjudicator is unreachable and the
/// classifier falls open.
const FAIL_OPEN_CONFIDENCE: i32 = 50;

/// What the adjudication model returns.
#[derive(Debug, Deserialize)]
struct AdjudicationResponse {
    relevant: bool,
    #[serde(default)]
    confidence: i32,
    #[serde(default)]
    reason: String,
}

/// Outcome of the staged relevance decision for one (project, article) pair.
#[derive(Debug, Clone)]
pub struct RelevanceOutcome {
    pub relevant: bool,
    /// 0-100, from the adjudicator (or a fixed value on fail-open/reject).
    pub confidence: i32,
    pub reason: String,
    /// Cosine similarity from the semantic stage. None when the pair was
    /// rejected before that stage ran, or when the embedding provider was
    /// unavailable.
    pub similarity: Option<f32>,
    /// Whether the project title literally appears in the article text.
    /// Diagnostic only; never gates the verdict.
    pub keyword_match: bool,
}

/// Decides per (project, article) relevance in increasing cost order:
/// triviality filter, embedding similarity gate, keyword diagnostic, LLM
/// adjudication. Negative stages short-circuit so the expensive call is
/// skipped whenever possible. Provider failures never propagate: the
/// embedding gate degrades to open and the adjudicator fails open, so an
/// unreachable provider cannot silently drop relevant content.
pub struct RelevanceClassifier {
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn TextEmbedder>,
    threshold: f32,
}

impl RelevanceClassifier {
    pub fn new(chat: Arc<dyn ChatModel>, embedder: Arc<dyn TextEmbedder>, threshold: f32) -> Self {
        Self {
            chat,
            embedder,
            threshold,
        }
    }

    pub async fn classify(&self, project: &Project, article: &Article) -> RelevanceOutcome {
        // Stage 1: an article with no title and no body is never relevant.
        if article.raw_title.trim().is_empty() && article.raw_text.trim().is_empty() {
            return RelevanceOutcome {
                relevant: false,
                confidence: 100,
                reason: "Empty article: no title and no body".to_string(),
                similarity: None,
                keyword_match: false,
            };
        }

        let project_text = format!("{} {}", project.title, project.description);
        let article_text = format!("{} {}", article.raw_title, article.raw_text);

        // Stage 2: embedding similarity gate.
        let similarity = self.similarity(&project_text, &article_text).await;
        if let Some(sim) = similarity {
            if sim < self.threshold {
                return RelevanceOutcome {
                    relevant: false,
                    confidence: 100,
                    reason: format!(
                        "Semantic similarity {sim:.2} below threshold {:.2}",
                        self.threshold
                    ),
                    similarity,
                    keyword_match: false,
                };
            }
        }

        // Stage 3: weak lexical signal, recorded but never used to reject.
        let keyword_match = !project.title.trim().is_empty()
            && article_text
                .to_lowercase()
                .contains(&project.title.to_lowercase());

        // Stage 4: LLM adjudication, failing open on any provider error.
        let (relevant, confidence, reason) = self.adjudicate(project, article).await;

        RelevanceOutcome {
            relevant,
            confidence: confidence.clamp(0, 100),
            reason,
            similarity,
            keyword_match,
        }
    }

    /// Cosine similarity between project and article embeddings. An
    /// embedding provider failure returns None: the gate opens rather than
    /// dropping the pair.
    async fn similarity(&self, project_text: &str, article_text: &str) -> Option<f32> {
        let project_embed = match self.embedder.embed(project_text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Embedding provider failed for project text, skipping similarity gate");
                return None;
            }
        };
        let article_embed = match self.embedder.embed(article_text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Embedding provider failed for article text, skipping similarity gate");
                return None;
            }
        };
        Some(cosine_similarity(&project_embed, &article_embed))
    }

    async fn adjudicate(&self, project: &Project, article: &Article) -> (bool, i32, String) {
        let preview = truncate_to_char_boundary(&article.raw_text, BODY_PREVIEW_BYTES);

        let prompt = format!(
            r#"PROJECT:
Title: {project_title}
Description: {project_description}

ARTICLE:
Title: {article_title}
Body: {preview}

Task: Decide if this article is relevant to the project.

Return ONLY JSON:
{{
  "relevant": true/false,
  "confidence": 0-100,
  "reason": "short explanation"
}}"#,
            project_title = project.title,
            project_description = project.description,
            article_title = article.raw_title,
        );

        let raw = match self
            .chat
            .complete_json("You are a relevance classifier.", &prompt)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    project = %project.title,
                    url = %article.url,
                    error = %e,
                    "Relevance adjudication failed, defaulting to relevant"
                );
                return (
                    true,
                    FAIL_OPEN_CONFIDENCE,
                    "Adjudicator unavailable; defaulted to relevant".to_string(),
                );
            }
        };

        match decode_json::<AdjudicationResponse>(&raw) {
            Ok(verdict) => (verdict.relevant, verdict.confidence, verdict.reason),
            Err(e) => {
                warn!(
                    project = %project.title,
                    url = %article.url,
                    error = %e,
                    "Unparseable adjudication response, defaulting to relevant"
                );
                (
                    true,
                    FAIL_OPEN_CONFIDENCE,
                    "Adjudication response unparseable; defaulted to relevant".to_string(),
                )
            }
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![0.5, 0.3, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
