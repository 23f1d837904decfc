// Test doubles for the analysis pipeline.
//
// Three doubles matching the three trait boundaries:
// - MemoryStore (ArticleStore) — stateful in-memory corpus
// - StubChat (ChatModel) — queued canned responses with call counting
// - FixedEmbedder (TextEmbedder) — deterministic bag-of-words vectors
//
// No network, no database. `cargo test` in seconds.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use briefwire_common::{
    AnalysedArticle, Article, ExtractedFields, MediaSource, NewArticle, Project,
    ProjectArticleAnalysis, ProjectInsight, ThematicArea,
};
use briefwire_store::ArticleStore;

use crate::traits::{ChatModel, TextEmbedder};

/// Dimension of the deterministic test vectors. Wide enough that disjoint
/// vocabularies stay far below the relevance threshold even with a few
/// hash collisions.
pub const TEST_EMBEDDING_DIM: usize = 512;

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    sources: HashMap<Uuid, MediaSource>,
    projects: HashMap<Uuid, Project>,
    subscriptions: Vec<(Uuid, Uuid)>, // (project, source)
    areas: Vec<ThematicArea>,
    articles: HashMap<Uuid, Article>,
    links: HashSet<(Uuid, Uuid)>, // (project, article)
    analyses: Vec<ProjectArticleAnalysis>,
    insights: Vec<ProjectInsight>,
}

/// In-memory ArticleStore with the same invariants as the Postgres schema:
/// unique article URL, unique (project, article) link, append-only
/// analyses and insights.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("MemoryStore poisoned")
    }

    // --- Seeding helpers ---

    pub fn add_source(&self, name: &str, feed_url: &str) -> MediaSource {
        let source = MediaSource {
            id: Uuid::new_v4(),
            name: name.to_string(),
            feed_url: feed_url.to_string(),
        };
        self.lock().sources.insert(source.id, source.clone());
        source
    }

    pub fn add_project(&self, title: &str, description: &str) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
        };
        self.lock().projects.insert(project.id, project.clone());
        project
    }

    pub fn subscribe(&self, project_id: Uuid, source_id: Uuid) {
        self.lock().subscriptions.push((project_id, source_id));
    }

    pub fn add_area(&self, project_id: Uuid, name: &str, description: &str) -> ThematicArea {
        let area = ThematicArea {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
            description: description.to_string(),
        };
        self.lock().areas.push(area.clone());
        area
    }

    pub fn add_article(&self, source_id: Uuid, title: &str, body: &str, url: &str) -> Article {
        let article = Article {
            id: Uuid::new_v4(),
            source_id,
            raw_title: title.to_string(),
            raw_text: body.to_string(),
            url: url.to_string(),
            published_at: None,
            scraped_at: Utc::now(),
            fields: ExtractedFields::default(),
            analysis_status: briefwire_common::AnalysisStatus::Raw,
        };
        self.lock().articles.insert(article.id, article.clone());
        article
    }

    // --- Assertion helpers ---

    pub fn article_count(&self) -> usize {
        self.lock().articles.len()
    }

    pub fn all_links(&self) -> Vec<(Uuid, Uuid)> {
        self.lock().links.iter().copied().collect()
    }

    pub fn analyses_for(&self, project_id: Uuid) -> Vec<ProjectArticleAnalysis> {
        self.lock()
            .analyses
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn insights_for(&self, project_id: Uuid) -> Vec<ProjectInsight> {
        self.lock()
            .insights
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn get_source(&self, id: Uuid) -> Result<Option<MediaSource>> {
        Ok(self.lock().sources.get(&id).cloned())
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.lock().projects.get(&id).cloned())
    }

    async fn projects_for_source(&self, source_id: Uuid) -> Result<Vec<Project>> {
        let inner = self.lock();
        let mut projects: Vec<Project> = inner
            .subscriptions
            .iter()
            .filter(|(_, sid)| *sid == source_id)
            .filter_map(|(pid, _)| inner.projects.get(pid).cloned())
            .collect();
        projects.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(projects)
    }

    async fn thematic_areas(&self, project_id: Uuid) -> Result<Vec<ThematicArea>> {
        Ok(self
            .lock()
            .areas
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_thematic_area(&self, area: &ThematicArea) -> Result<()> {
        self.lock().areas.push(area.clone());
        Ok(())
    }

    async fn find_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self
            .lock()
            .articles
            .values()
            .find(|a| a.url == url)
            .cloned())
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.lock().articles.get(&id).cloned())
    }

    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let mut inner = self.lock();
        if inner.articles.values().any(|a| a.url == article.url) {
            bail!("duplicate article url: {}", article.url);
        }
        let stored = Article {
            id: Uuid::new_v4(),
            source_id: article.source_id,
            raw_title: article.raw_title.clone(),
            raw_text: article.raw_text.clone(),
            url: article.url.clone(),
            published_at: article.published_at,
            scraped_at: Utc::now(),
            fields: ExtractedFields::default(),
            analysis_status: briefwire_common::AnalysisStatus::Raw,
        };
        inner.articles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn raw_article_ids(&self) -> Result<Vec<Uuid>> {
        let inner = self.lock();
        let mut articles: Vec<&Article> = inner
            .articles
            .values()
            .filter(|a| a.analysis_status == briefwire_common::AnalysisStatus::Raw)
            .collect();
        articles.sort_by_key(|a| a.scraped_at);
        Ok(articles.iter().map(|a| a.id).collect())
    }

    async fn update_article_fields(&self, id: Uuid, fields: &ExtractedFields) -> Result<()> {
        let mut inner = self.lock();
        let article = inner
            .articles
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no article {id}"))?;
        article.fields = fields.clone();
        article.analysis_status = briefwire_common::AnalysisStatus::Extracted;
        Ok(())
    }

    async fn link_article(&self, project_id: Uuid, article_id: Uuid) -> Result<bool> {
        Ok(self.lock().links.insert((project_id, article_id)))
    }

    async fn project_ids_for_article(&self, article_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .lock()
            .links
            .iter()
            .filter(|(_, aid)| *aid == article_id)
            .map(|(pid, _)| *pid)
            .collect())
    }

    async fn insert_analysis(&self, analysis: &ProjectArticleAnalysis) -> Result<()> {
        self.lock().analyses.push(analysis.clone());
        Ok(())
    }

    async fn latest_analysis(
        &self,
        project_id: Uuid,
        article_id: Uuid,
    ) -> Result<Option<ProjectArticleAnalysis>> {
        Ok(self
            .lock()
            .analyses
            .iter()
            .filter(|a| a.project_id == project_id && a.media_item_id == article_id)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn relevant_articles(&self, project_id: Uuid) -> Result<Vec<Article>> {
        let inner = self.lock();
        let mut latest: HashMap<Uuid, &ProjectArticleAnalysis> = HashMap::new();
        for analysis in inner.analyses.iter().filter(|a| a.project_id == project_id) {
            let entry = latest.entry(analysis.media_item_id).or_insert(analysis);
            if analysis.created_at >= entry.created_at {
                *entry = analysis;
            }
        }
        let mut articles: Vec<Article> = latest
            .values()
            .filter(|a| a.relevant)
            .filter_map(|a| inner.articles.get(&a.media_item_id).cloned())
            .collect();
        articles.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        Ok(articles)
    }

    async fn analysed_articles(&self, project_id: Uuid) -> Result<Vec<AnalysedArticle>> {
        let rows = {
            let inner = self.lock();
            let mut latest: HashMap<Uuid, ProjectArticleAnalysis> = HashMap::new();
            for analysis in inner.analyses.iter().filter(|a| a.project_id == project_id) {
                let entry = latest
                    .entry(analysis.media_item_id)
                    .or_insert_with(|| analysis.clone());
                if analysis.created_at >= entry.created_at {
                    *entry = analysis.clone();
                }
            }
            let mut rows: Vec<AnalysedArticle> = latest
                .values()
                .filter_map(|a| {
                    let article = inner.articles.get(&a.media_item_id)?;
                    if article.analysis_status != briefwire_common::AnalysisStatus::Extracted {
                        return None;
                    }
                    Some(AnalysedArticle {
                        media_id: article.id,
                        project_id,
                        title: article.raw_title.clone(),
                        url: article.url.clone(),
                        published_at: article.published_at,
                        scraped_at: article.scraped_at,
                        fields: article.fields.clone(),
                        relevant: a.relevant,
                        matched_thematic_areas: a.matched_thematic_area_meta.clone(),
                        summary: a.summary.clone(),
                    })
                })
                .collect();
            rows.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
            rows
        };
        Ok(rows)
    }

    async fn insert_insight(&self, insight: &ProjectInsight) -> Result<()> {
        self.lock().insights.push(insight.clone());
        Ok(())
    }

    async fn latest_insight(&self, project_id: Uuid) -> Result<Option<ProjectInsight>> {
        Ok(self
            .lock()
            .insights
            .iter()
            .filter(|i| i.project_id == project_id)
            .max_by_key(|i| i.generated_at)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// StubChat
// ---------------------------------------------------------------------------

/// Queued canned responses, popped per call. When the queue is empty the
/// optional default is served; with no default, the call errors (which the
/// fail-open stages treat as a provider failure).
#[derive(Default)]
pub struct StubChat {
    responses: Mutex<VecDeque<Result<String, String>>>,
    default_response: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a successful canned response.
    pub fn respond(self, body: &str) -> Self {
        self.responses
            .lock()
            .expect("StubChat poisoned")
            .push_back(Ok(body.to_string()));
        self
    }

    /// Push a simulated provider failure.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .expect("StubChat poisoned")
            .push_back(Err(message.to_string()));
        self
    }

    /// Serve this body whenever the queue runs dry.
    pub fn with_default(mut self, body: &str) -> Self {
        self.default_response = Some(body.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("StubChat poisoned").len()
    }

    fn next(&self, user: &str) -> Result<String> {
        self.calls
            .lock()
            .expect("StubChat poisoned")
            .push(user.to_string());

        match self
            .responses
            .lock()
            .expect("StubChat poisoned")
            .pop_front()
        {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(anyhow!("stubbed provider failure: {message}")),
            None => match &self.default_response {
                Some(body) => Ok(body.clone()),
                None => Err(anyhow!("StubChat: no stubbed response left")),
            },
        }
    }
}

#[async_trait]
impl ChatModel for StubChat {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        self.next(user)
    }

    async fn complete_json(&self, _system: &str, user: &str) -> Result<String> {
        self.next(user)
    }
}

// ---------------------------------------------------------------------------
// Embedders
// ---------------------------------------------------------------------------

/// Deterministic bag-of-words embedding: texts sharing words are similar,
/// disjoint texts are orthogonal. Counts calls so tests can assert the
/// embedding stage was skipped.
#[derive(Default)]
pub struct FixedEmbedder {
    calls: Mutex<usize>,
}

impl FixedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("FixedEmbedder poisoned")
    }
}

/// Hash each lowercase word into one of TEST_EMBEDDING_DIM buckets.
pub fn hash_embed(text: &str) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut vector = vec![0.0f32; TEST_EMBEDDING_DIM];
    for word in text.to_lowercase().split_whitespace() {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        vector[(hasher.finish() as usize) % TEST_EMBEDDING_DIM] += 1.0;
    }
    vector
}

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        *self.calls.lock().expect("FixedEmbedder poisoned") += 1;
        Ok(hash_embed(text))
    }
}

/// Embedder that always errors, for exercising the degraded similarity gate.
pub struct FailingEmbedder;

#[async_trait]
impl TextEmbedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(anyhow!("embedding provider unreachable"))
    }
}
