use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use briefwire_common::{
    AnalysedArticle, Article, ExtractedFields, MediaSource, NewArticle, Project,
    ProjectArticleAnalysis, ProjectInsight, ThematicArea,
};

/// Durable keyed storage for articles, project links, analyses, and
/// insights. Every call acquires a connection for that one operation; no
/// transaction spans an external network call.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    // --- Sources and projects ---

    async fn get_source(&self, id: Uuid) -> Result<Option<MediaSource>>;

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// All projects subscribed to a source, resolved once per scrape run.
    async fn projects_for_source(&self, source_id: Uuid) -> Result<Vec<Project>>;

    /// A project's thematic taxonomy, in insertion order.
    async fn thematic_areas(&self, project_id: Uuid) -> Result<Vec<ThematicArea>>;

    async fn insert_thematic_area(&self, area: &ThematicArea) -> Result<()>;

    // --- Articles ---

    /// Look up an article by its locator. The corpus holds at most one row
    /// per URL.
    async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>>;

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>>;

    /// Insert a freshly ingested article with status `raw`.
    async fn insert_article(&self, article: &NewArticle) -> Result<Article>;

    /// IDs of every article still awaiting extraction.
    async fn raw_article_ids(&self) -> Result<Vec<Uuid>>;

    /// Persist extracted fields and advance the article to `extracted`.
    async fn update_article_fields(&self, id: Uuid, fields: &ExtractedFields) -> Result<()>;

    // --- Project-article links ---

    /// Link an article to a project. Idempotent: returns true if a link was
    /// created, false if the pair was already linked.
    async fn link_article(&self, project_id: Uuid, article_id: Uuid) -> Result<bool>;

    async fn project_ids_for_article(&self, article_id: Uuid) -> Result<Vec<Uuid>>;

    // --- Per-project analyses ---

    /// Append an analysis row for a (project, article) pair. Earlier rows
    /// are retained as history; the newest `created_at` is authoritative.
    async fn insert_analysis(&self, analysis: &ProjectArticleAnalysis) -> Result<()>;

    async fn latest_analysis(
        &self,
        project_id: Uuid,
        article_id: Uuid,
    ) -> Result<Option<ProjectArticleAnalysis>>;

    /// Articles whose latest analysis for this project says relevant.
    async fn relevant_articles(&self, project_id: Uuid) -> Result<Vec<Article>>;

    /// Read model for reporting: extracted articles joined with their
    /// latest analysis for a project.
    async fn analysed_articles(&self, project_id: Uuid) -> Result<Vec<AnalysedArticle>>;

    // --- Insights ---

    /// Persist a new insight snapshot. Never overwrites a prior snapshot.
    async fn insert_insight(&self, insight: &ProjectInsight) -> Result<()>;

    async fn latest_insight(&self, project_id: Uuid) -> Result<Option<ProjectInsight>>;
}
