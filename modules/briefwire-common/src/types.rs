use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Sources and projects ---

/// A syndicated feed source articles are ingested from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSource {
    pub id: Uuid,
    pub name: String,
    pub feed_url: String,
}

/// A client research brief: a topic of interest with its own thematic
/// taxonomy and subscribed sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

/// Project-scoped taxonomy entry articles can be classified into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThematicArea {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Lightweight (id, name) reference to a thematic area, stored alongside
/// analyses so readers don't need a join to render matched themes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThematicAreaRef {
    pub id: Uuid,
    pub name: String,
}

// --- Articles ---

/// Where an article sits in the extraction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Raw,
    Extracted,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Raw => "raw",
            AnalysisStatus::Extracted => "extracted",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(AnalysisStatus::Raw),
            "extracted" => Ok(AnalysisStatus::Extracted),
            other => Err(format!("unknown analysis status: {other}")),
        }
    }
}

/// Structured analytical fields extracted once per article, independent of
/// which projects consume it. The shape never varies: a field the model
/// omits is an empty string, not an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub industry_name: String,
    #[serde(default)]
    pub industry_tactic: String,
    #[serde(default)]
    pub stakeholders: String,
    #[serde(default)]
    pub targeted_policy: String,
    #[serde(default)]
    pub geographical_focus: String,
    #[serde(default)]
    pub outcome_impact: String,
}

/// A deduplicated unit of scraped content, keyed by its URL.
/// Global: many projects reference one article through links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub source_id: Uuid,
    pub raw_title: String,
    pub raw_text: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: ExtractedFields,
    pub analysis_status: AnalysisStatus,
}

impl Article {
    /// Text used for classification and extraction: the body, or the title
    /// alone when no body was captured.
    pub fn analysis_text(&self) -> &str {
        if self.raw_text.trim().is_empty() {
            &self.raw_title
        } else {
            &self.raw_text
        }
    }
}

/// Insert payload for a freshly ingested article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: Uuid,
    pub raw_title: String,
    pub raw_text: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

// --- Per-project analysis ---

/// Outcome of classifying one article for one project. Append-only; the
/// newest row per (project, article) pair is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectArticleAnalysis {
    pub id: Uuid,
    pub media_item_id: Uuid,
    pub project_id: Uuid,
    pub relevant: bool,
    /// 0-100, from the adjudication stage.
    pub relevance_confidence: i32,
    pub relevance_reason: String,
    pub matched_thematic_area_ids: Vec<Uuid>,
    pub matched_thematic_area_meta: Vec<ThematicAreaRef>,
    pub extracted_fields_snapshot: ExtractedFields,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Read model joining an article with its latest analysis for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysedArticle {
    pub media_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub fields: ExtractedFields,
    pub relevant: bool,
    pub matched_thematic_areas: Vec<ThematicAreaRef>,
    pub summary: String,
}

// --- Insights ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default)]
    pub positive: i32,
    #[serde(default)]
    pub negative: i32,
    #[serde(default)]
    pub neutral: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMap {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// A timestamped synthesis snapshot for a project. Immutable once written;
/// "latest" is by `generated_at` descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInsight {
    pub id: Uuid,
    pub project_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: String,
    pub topic_clusters: Vec<String>,
    pub subthemes: Vec<String>,
    pub sentiment: Sentiment,
    pub entities: EntityMap,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub recommendations: Vec<String>,
    /// URLs of the articles that contributed to this snapshot. Empty for a
    /// placeholder snapshot written when no articles were relevant.
    pub article_links: Vec<String>,
    pub highlights: Vec<String>,
}

// --- Batch progress ---

/// Progress of one bulk classification/extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub done: usize,
    pub running: bool,
}
