use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use briefwire_common::{
    Article, BriefwireError, ExtractedFields, ProjectArticleAnalysis, RelevancePolicy,
    ThematicArea, ThematicAreaRef,
};
use briefwire_store::ArticleStore;

use crate::fields::FieldExtractor;
use crate::relevance::{RelevanceClassifier, RelevanceOutcome};
use crate::thematic::ThematicClassifier;
use crate::traits::{ChatModel, TextEmbedder};

/// Outcome of processing one article for one linked project.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub project_id: Uuid,
    pub relevant: bool,
    pub confidence: i32,
    pub reason: String,
    pub matched_areas: Vec<ThematicAreaRef>,
}

/// Full report for one processed article.
#[derive(Debug, Clone)]
pub struct ArticleReport {
    pub article_id: Uuid,
    pub fields: ExtractedFields,
    pub projects: Vec<ProjectOutcome>,
}

/// Per-article composition of the classification stages.
///
/// Field extraction runs once per article (the fields describe the article
/// itself) and is a hard failure. The per-project work (relevance, themes,
/// the analysis write) degrades per project: one project's bad day never
/// costs its siblings their analysis.
pub struct AnalysisPipeline {
    store: Arc<dyn ArticleStore>,
    relevance: RelevanceClassifier,
    thematic: ThematicClassifier,
    fields: FieldExtractor,
    policy: RelevancePolicy,
}

impl AnalysisPipeline {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn TextEmbedder>,
        relevance_threshold: f32,
        policy: RelevancePolicy,
    ) -> Self {
        Self {
            store,
            relevance: RelevanceClassifier::new(chat.clone(), embedder, relevance_threshold),
            thematic: ThematicClassifier::new(chat.clone()),
            fields: FieldExtractor::new(chat),
            policy,
        }
    }

    pub async fn process_article(&self, article_id: Uuid) -> anyhow::Result<ArticleReport> {
        let article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| BriefwireError::NotFound(format!("article {article_id}")))?;

        let project_ids = self.store.project_ids_for_article(article_id).await?;
        if project_ids.is_empty() {
            return Err(BriefwireError::Validation(format!(
                "article {article_id} is not linked to any project"
            ))
            .into());
        }

        // Global extraction, once per article.
        let fields = self.fields.extract(&article).await?;
        self.store.update_article_fields(article_id, &fields).await?;

        let mut projects = Vec::with_capacity(project_ids.len());
        for project_id in project_ids {
            let outcome = match self.process_for_project(project_id, &article, &fields).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        %project_id,
                        url = %article.url,
                        error = %e,
                        "Per-project analysis failed, continuing with remaining projects"
                    );
                    continue;
                }
            };
            projects.push(outcome);
        }

        info!(
            %article_id,
            url = %article.url,
            projects = projects.len(),
            "Article processed"
        );

        Ok(ArticleReport {
            article_id,
            fields,
            projects,
        })
    }

    async fn process_for_project(
        &self,
        project_id: Uuid,
        article: &Article,
        fields: &ExtractedFields,
    ) -> anyhow::Result<ProjectOutcome> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| BriefwireError::NotFound(format!("project {project_id}")))?;

        let outcome = self.relevance.classify(&project, article).await;

        let areas = self.store.thematic_areas(project_id).await?;
        let matched_ids = if outcome.relevant {
            self.thematic.classify(article.analysis_text(), &areas).await
        } else {
            Vec::new()
        };
        let matched_areas = area_refs(&areas, &matched_ids);

        let relevant = match self.policy {
            RelevancePolicy::Adjudicated => outcome.relevant,
            RelevancePolicy::Hybrid => outcome.relevant && !matched_areas.is_empty(),
        };

        let summary = summarize(&outcome, relevant, &matched_areas);

        let analysis = ProjectArticleAnalysis {
            id: Uuid::new_v4(),
            media_item_id: article.id,
            project_id,
            relevant,
            relevance_confidence: outcome.confidence,
            relevance_reason: outcome.reason.clone(),
            matched_thematic_area_ids: matched_ids,
            matched_thematic_area_meta: matched_areas.clone(),
            extracted_fields_snapshot: fields.clone(),
            summary,
            created_at: Utc::now(),
        };
        self.store.insert_analysis(&analysis).await?;

        Ok(ProjectOutcome {
            project_id,
            relevant,
            confidence: outcome.confidence,
            reason: outcome.reason,
            matched_areas,
        })
    }
}

fn area_refs(areas: &[ThematicArea], matched_ids: &[Uuid]) -> Vec<ThematicAreaRef> {
    matched_ids
        .iter()
        .filter_map(|id| {
            areas.iter().find(|a| a.id == *id).map(|a| ThematicAreaRef {
                id: a.id,
                name: a.name.clone(),
            })
        })
        .collect()
}

fn summarize(outcome: &RelevanceOutcome, relevant: bool, matched: &[ThematicAreaRef]) -> String {
    if !relevant {
        return format!("Not relevant: {}", outcome.reason);
    }
    let mut summary = format!("Relevant ({}%): {}", outcome.confidence, outcome.reason);
    if !matched.is_empty() {
        let names: Vec<&str> = matched.iter().map(|m| m.name.as_str()).collect();
        summary.push_str(&format!(" Themes: {}.", names.join(", ")));
    }
    summary
}
