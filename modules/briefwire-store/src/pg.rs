// Postgres implementation of the ArticleStore.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use briefwire_common::{
    AnalysedArticle, AnalysisStatus, Article, EntityMap, ExtractedFields, MediaSource, NewArticle,
    Project, ProjectArticleAnalysis, ProjectInsight, Sentiment, ThematicArea, ThematicAreaRef,
};

use crate::ArticleStore;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// --- Row types ---

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: Uuid,
    source_id: Uuid,
    raw_title: String,
    raw_text: String,
    url: String,
    published_at: Option<DateTime<Utc>>,
    scraped_at: DateTime<Utc>,
    industry_name: String,
    industry_tactic: String,
    stakeholders: String,
    targeted_policy: String,
    geographical_focus: String,
    outcome_impact: String,
    analysis_status: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            raw_title: row.raw_title,
            raw_text: row.raw_text,
            url: row.url,
            published_at: row.published_at,
            scraped_at: row.scraped_at,
            fields: ExtractedFields {
                industry_name: row.industry_name,
                industry_tactic: row.industry_tactic,
                stakeholders: row.stakeholders,
                targeted_policy: row.targeted_policy,
                geographical_focus: row.geographical_focus,
                outcome_impact: row.outcome_impact,
            },
            analysis_status: row
                .analysis_status
                .parse()
                .unwrap_or(AnalysisStatus::Raw),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    media_item_id: Uuid,
    project_id: Uuid,
    relevant: bool,
    relevance_confidence: i32,
    relevance_reason: String,
    matched_thematic_area_ids: serde_json::Value,
    matched_thematic_area_meta: serde_json::Value,
    extracted_fields_snapshot: serde_json::Value,
    summary: String,
    created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for ProjectArticleAnalysis {
    fn from(row: AnalysisRow) -> Self {
        ProjectArticleAnalysis {
            id: row.id,
            media_item_id: row.media_item_id,
            project_id: row.project_id,
            relevant: row.relevant,
            relevance_confidence: row.relevance_confidence,
            relevance_reason: row.relevance_reason,
            matched_thematic_area_ids: serde_json::from_value(row.matched_thematic_area_ids)
                .unwrap_or_default(),
            matched_thematic_area_meta: serde_json::from_value(row.matched_thematic_area_meta)
                .unwrap_or_default(),
            extracted_fields_snapshot: serde_json::from_value(row.extracted_fields_snapshot)
                .unwrap_or_default(),
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InsightRow {
    id: Uuid,
    project_id: Uuid,
    generated_at: DateTime<Utc>,
    executive_summary: String,
    topic_clusters: serde_json::Value,
    subthemes: serde_json::Value,
    sentiment: serde_json::Value,
    entities: serde_json::Value,
    risks: serde_json::Value,
    opportunities: serde_json::Value,
    recommendations: serde_json::Value,
    article_links: serde_json::Value,
    highlights: serde_json::Value,
}

impl From<InsightRow> for ProjectInsight {
    fn from(row: InsightRow) -> Self {
        fn list(value: serde_json::Value) -> Vec<String> {
            serde_json::from_value(value).unwrap_or_default()
        }

        ProjectInsight {
            id: row.id,
            project_id: row.project_id,
            generated_at: row.generated_at,
            executive_summary: row.executive_summary,
            topic_clusters: list(row.topic_clusters),
            subthemes: list(row.subthemes),
            sentiment: serde_json::from_value::<Sentiment>(row.sentiment).unwrap_or_default(),
            entities: serde_json::from_value::<EntityMap>(row.entities).unwrap_or_default(),
            risks: list(row.risks),
            opportunities: list(row.opportunities),
            recommendations: list(row.recommendations),
            article_links: list(row.article_links),
            highlights: list(row.highlights),
        }
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn get_source(&self, id: Uuid) -> Result<Option<MediaSource>> {
        #[derive(sqlx::FromRow)]
        struct SourceRow {
            id: Uuid,
            name: String,
            feed_url: String,
        }

        let row = sqlx::query_as::<_, SourceRow>(
            "SELECT id, name, feed_url FROM media_sources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| MediaSource {
            id: r.id,
            name: r.name,
            feed_url: r.feed_url,
        }))
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        #[derive(sqlx::FromRow)]
        struct ProjectRow {
            id: Uuid,
            title: String,
            description: String,
        }

        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, title, description FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Project {
            id: r.id,
            title: r.title,
            description: r.description,
        }))
    }

    async fn projects_for_source(&self, source_id: Uuid) -> Result<Vec<Project>> {
        #[derive(sqlx::FromRow)]
        struct ProjectRow {
            id: Uuid,
            title: String,
            description: String,
        }

        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.id, p.title, p.description
            FROM projects p
            JOIN project_sources ps ON ps.project_id = p.id
            WHERE ps.source_id = $1
            ORDER BY p.title
            "#,
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Project {
                id: r.id,
                title: r.title,
                description: r.description,
            })
            .collect())
    }

    async fn thematic_areas(&self, project_id: Uuid) -> Result<Vec<ThematicArea>> {
        #[derive(sqlx::FromRow)]
        struct AreaRow {
            id: Uuid,
            project_id: Uuid,
            name: String,
            description: String,
        }

        let rows = sqlx::query_as::<_, AreaRow>(
            "SELECT id, project_id, name, description FROM thematic_areas WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ThematicArea {
                id: r.id,
                project_id: r.project_id,
                name: r.name,
                description: r.description,
            })
            .collect())
    }

    async fn insert_thematic_area(&self, area: &ThematicArea) -> Result<()> {
        sqlx::query(
            "INSERT INTO thematic_areas (id, project_id, name, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(area.id)
        .bind(area.project_id)
        .bind(&area.name)
        .bind(&area.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>("SELECT * FROM media_items WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Article::from))
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>("SELECT * FROM media_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Article::from))
    }

    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let id = Uuid::new_v4();
        let scraped_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO media_items
                (id, source_id, raw_title, raw_text, url, published_at, scraped_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(article.source_id)
        .bind(&article.raw_title)
        .bind(&article.raw_text)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(scraped_at)
        .execute(&self.pool)
        .await?;

        Ok(Article {
            id,
            source_id: article.source_id,
            raw_title: article.raw_title.clone(),
            raw_text: article.raw_text.clone(),
            url: article.url.clone(),
            published_at: article.published_at,
            scraped_at,
            fields: ExtractedFields::default(),
            analysis_status: AnalysisStatus::Raw,
        })
    }

    async fn raw_article_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM media_items WHERE analysis_status = 'raw' ORDER BY scraped_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn update_article_fields(&self, id: Uuid, fields: &ExtractedFields) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE media_items SET
                industry_name = $1,
                industry_tactic = $2,
                stakeholders = $3,
                targeted_policy = $4,
                geographical_focus = $5,
                outcome_impact = $6,
                analysis_status = 'extracted'
            WHERE id = $7
            "#,
        )
        .bind(&fields.industry_name)
        .bind(&fields.industry_tactic)
        .bind(&fields.stakeholders)
        .bind(&fields.targeted_policy)
        .bind(&fields.geographical_focus)
        .bind(&fields.outcome_impact)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn link_article(&self, project_id: Uuid, article_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO project_media_items (project_id, media_item_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, media_item_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(article_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn project_ids_for_article(&self, article_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT project_id FROM project_media_items WHERE media_item_id = $1",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn insert_analysis(&self, analysis: &ProjectArticleAnalysis) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO media_item_project_analysis
                (id, media_item_id, project_id, relevant, relevance_confidence,
                 relevance_reason, matched_thematic_area_ids, matched_thematic_area_meta,
                 extracted_fields_snapshot, summary, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(analysis.id)
        .bind(analysis.media_item_id)
        .bind(analysis.project_id)
        .bind(analysis.relevant)
        .bind(analysis.relevance_confidence)
        .bind(&analysis.relevance_reason)
        .bind(serde_json::to_value(&analysis.matched_thematic_area_ids)?)
        .bind(serde_json::to_value(&analysis.matched_thematic_area_meta)?)
        .bind(serde_json::to_value(&analysis.extracted_fields_snapshot)?)
        .bind(&analysis.summary)
        .bind(analysis.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_analysis(
        &self,
        project_id: Uuid,
        article_id: Uuid,
    ) -> Result<Option<ProjectArticleAnalysis>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM media_item_project_analysis
            WHERE project_id = $1 AND media_item_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProjectArticleAnalysis::from))
    }

    async fn relevant_articles(&self, project_id: Uuid) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT m.* FROM media_items m
            JOIN (
                SELECT DISTINCT ON (media_item_id) media_item_id, relevant
                FROM media_item_project_analysis
                WHERE project_id = $1
                ORDER BY media_item_id, created_at DESC
            ) a ON a.media_item_id = m.id
            WHERE a.relevant
            ORDER BY m.scraped_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn analysed_articles(&self, project_id: Uuid) -> Result<Vec<AnalysedArticle>> {
        #[derive(sqlx::FromRow)]
        struct AnalysedRow {
            id: Uuid,
            raw_title: String,
            url: String,
            published_at: Option<DateTime<Utc>>,
            scraped_at: DateTime<Utc>,
            industry_name: String,
            industry_tactic: String,
            stakeholders: String,
            targeted_policy: String,
            geographical_focus: String,
            outcome_impact: String,
            relevant: bool,
            matched_thematic_area_meta: serde_json::Value,
            summary: String,
        }

        let rows = sqlx::query_as::<_, AnalysedRow>(
            r#"
            SELECT
                m.id, m.raw_title, m.url, m.published_at, m.scraped_at,
                m.industry_name, m.industry_tactic, m.stakeholders,
                m.targeted_policy, m.geographical_focus, m.outcome_impact,
                a.relevant, a.matched_thematic_area_meta, a.summary
            FROM media_items m
            JOIN (
                SELECT DISTINCT ON (media_item_id) *
                FROM media_item_project_analysis
                WHERE project_id = $1
                ORDER BY media_item_id, created_at DESC
            ) a ON a.media_item_id = m.id
            WHERE m.analysis_status = 'extracted'
            ORDER BY m.scraped_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AnalysedArticle {
                media_id: r.id,
                project_id,
                title: r.raw_title,
                url: r.url,
                published_at: r.published_at,
                scraped_at: r.scraped_at,
                fields: ExtractedFields {
                    industry_name: r.industry_name,
                    industry_tactic: r.industry_tactic,
                    stakeholders: r.stakeholders,
                    targeted_policy: r.targeted_policy,
                    geographical_focus: r.geographical_focus,
                    outcome_impact: r.outcome_impact,
                },
                relevant: r.relevant,
                matched_thematic_areas: serde_json::from_value::<Vec<ThematicAreaRef>>(
                    r.matched_thematic_area_meta,
                )
                .unwrap_or_default(),
                summary: r.summary,
            })
            .collect())
    }

    async fn insert_insight(&self, insight: &ProjectInsight) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_insights
                (id, project_id, generated_at, executive_summary, topic_clusters,
                 subthemes, sentiment, entities, risks, opportunities,
                 recommendations, article_links, highlights)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(insight.id)
        .bind(insight.project_id)
        .bind(insight.generated_at)
        .bind(&insight.executive_summary)
        .bind(serde_json::to_value(&insight.topic_clusters)?)
        .bind(serde_json::to_value(&insight.subthemes)?)
        .bind(serde_json::to_value(insight.sentiment)?)
        .bind(serde_json::to_value(&insight.entities)?)
        .bind(serde_json::to_value(&insight.risks)?)
        .bind(serde_json::to_value(&insight.opportunities)?)
        .bind(serde_json::to_value(&insight.recommendations)?)
        .bind(serde_json::to_value(&insight.article_links)?)
        .bind(serde_json::to_value(&insight.highlights)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_insight(&self, project_id: Uuid) -> Result<Option<ProjectInsight>> {
        let row = sqlx::query_as::<_, InsightRow>(
            r#"
            SELECT * FROM project_insights
            WHERE project_id = $1
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProjectInsight::from))
    }
}
