use std::sync::Arc;

use ai_client::util::{decode_json, truncate_to_char_boundary};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use briefwire_common::{
    Article, BriefwireError, EntityMap, Project, ProjectInsight, Sentiment,
};
use briefwire_store::ArticleStore;

use crate::traits::ChatModel;

/// Per-article body cap in the aggregation digest. The synthesis prompt
/// has a finite size; bodies are truncated, not dropped.
const DIGEST_BODY_BYTES: usize = 2000;

/// What the synthesis model returns. `executive_summary` is required: a
/// response without it fails to decode, and a partial insight is worse
/// than none.
#[derive(Debug, Deserialize)]
struct InsightResponse {
    executive_summary: String,
    #[serde(default)]
    topic_clusters: Vec<String>,
    #[serde(default)]
    subthemes: Vec<String>,
    #[serde(default)]
    sentiment: Sentiment,
    #[serde(default)]
    entities: EntityMap,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    highlights: Vec<String>,
}

/// Aggregates a project's relevant articles into one structured
/// intelligence snapshot. Snapshots are append-only; each run writes a new
/// one and never touches its predecessors. A project with zero relevant
/// articles still gets a queryable empty snapshot, without a provider
/// call.
pub struct InsightSynthesizer {
    store: Arc<dyn ArticleStore>,
    chat: Arc<dyn ChatModel>,
}

impl InsightSynthesizer {
    pub fn new(store: Arc<dyn ArticleStore>, chat: Arc<dyn ChatModel>) -> Self {
        Self { store, chat }
    }

    pub async fn synthesize_project(&self, project_id: Uuid) -> anyhow::Result<ProjectInsight> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| BriefwireError::NotFound(format!("project {project_id}")))?;

        let articles = self.store.relevant_articles(project_id).await?;

        if articles.is_empty() {
            let insight = empty_insight(project_id);
            self.store.insert_insight(&insight).await?;
            info!(project = %project.title, "No relevant articles; wrote empty insight snapshot");
            return Ok(insight);
        }

        let insight = self.synthesize(&project, &articles).await?;
        self.store.insert_insight(&insight).await?;

        info!(
            project = %project.title,
            articles = articles.len(),
            risks = insight.risks.len(),
            opportunities = insight.opportunities.len(),
            "Insight snapshot written"
        );
        Ok(insight)
    }

    async fn synthesize(
        &self,
        project: &Project,
        articles: &[Article],
    ) -> anyhow::Result<ProjectInsight> {
        let digest: Vec<String> = articles
            .iter()
            .map(|a| {
                let preview = truncate_to_char_boundary(&a.raw_text, DIGEST_BODY_BYTES);
                format!("---\nTITLE: {}\nURL: {}\nTEXT: {}", a.raw_title, a.url, preview)
            })
            .collect();

        let prompt = format!(
            r#"Project Title: {title}
Project Description: {description}

Below is a collection of media articles relevant to this project.

Analyze ALL the articles combined and return ONLY valid JSON with these fields:

{{
  "executive_summary": "2-3 short paragraphs",
  "topic_clusters": [],
  "subthemes": [],
  "sentiment": {{"positive": 0, "negative": 0, "neutral": 0}},
  "entities": {{"people": [], "organizations": [], "locations": []}},
  "risks": ["each risk, citing contributing article URLs where possible"],
  "opportunities": ["each opportunity, citing contributing article URLs where possible"],
  "recommendations": ["concrete next steps for the client"],
  "highlights": ["one line per key insight, mentioning the article URL(s) behind it"]
}}

Sentiment counts articles by overall tone.

Articles:
{digest}"#,
            title = project.title,
            description = project.description,
            digest = digest.join("\n"),
        );

        let raw = self
            .chat
            .complete_json("You are a media intelligence system.", &prompt)
            .await
            .map_err(|e| BriefwireError::Provider(format!("insight synthesis: {e}")))?;

        let response: InsightResponse = decode_json(&raw)
            .map_err(|e| BriefwireError::Parse(format!("insight synthesis: {e}")))?;

        Ok(ProjectInsight {
            id: Uuid::new_v4(),
            project_id: project.id,
            generated_at: Utc::now(),
            executive_summary: response.executive_summary,
            topic_clusters: response.topic_clusters,
            subthemes: response.subthemes,
            sentiment: response.sentiment,
            entities: response.entities,
            risks: response.risks,
            opportunities: response.opportunities,
            recommendations: response.recommendations,
            article_links: articles.iter().map(|a| a.url.clone()).collect(),
            highlights: response.highlights,
        })
    }
}

fn empty_insight(project_id: Uuid) -> ProjectInsight {
    ProjectInsight {
        id: Uuid::new_v4(),
        project_id,
        generated_at: Utc::now(),
        executive_summary: String::new(),
        topic_clusters: Vec::new(),
        subthemes: Vec::new(),
        sentiment: Sentiment::default(),
        entities: EntityMap::default(),
        risks: Vec::new(),
        opportunities: Vec::new(),
        recommendations: Vec::new(),
        article_links: Vec::new(),
        highlights: Vec::new(),
    }
}
