use std::sync::Arc;

use ai_client::util::{decode_json, truncate_to_char_boundary};
use serde::Deserialize;

use briefwire_common::{Article, BriefwireError, ExtractedFields};

use crate::traits::ChatModel;

/// Bodies shorter than this are too thin to inform extraction; the title
/// is used alone instead.
const MIN_BODY_CHARS: usize = 50;

/// Cap on article text sent to the extraction model.
const MAX_EXTRACTION_BYTES: usize = 30_000;

/// Stakeholders arrive from the model as either a list or a single string;
/// both normalize to one comma-joined string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Stakeholders {
    List(Vec<String>),
    One(String),
}

impl Default for Stakeholders {
    fn default() -> Self {
        Stakeholders::One(String::new())
    }
}

impl Stakeholders {
    fn join(self) -> String {
        match self {
            Stakeholders::List(items) => items.join(", "),
            Stakeholders::One(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FieldsResponse {
    #[serde(default)]
    industry_name: String,
    #[serde(default)]
    industry_tactic: String,
    #[serde(default)]
    stakeholders: Stakeholders,
    #[serde(default)]
    targeted_policy: String,
    #[serde(default)]
    geographical_focus: String,
    #[serde(default)]
    outcome_impact: String,
}

/// Derives the six global analytical fields from an article. Extraction is
/// per article, not per project; the result's shape never varies (omitted
/// fields become empty strings). Unlike classification, a provider or
/// parse failure here is a hard error for the caller, since these fields
/// are persisted user-facing content.
pub struct FieldExtractor {
    chat: Arc<dyn ChatModel>,
}

impl FieldExtractor {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    pub async fn extract(&self, article: &Article) -> anyhow::Result<ExtractedFields> {
        let text = if article.raw_text.trim().len() < MIN_BODY_CHARS {
            article.raw_title.clone()
        } else {
            format!("{}\n\n{}", article.raw_title, article.raw_text)
        };
        let text = truncate_to_char_boundary(&text, MAX_EXTRACTION_BYTES);

        let prompt = format!(
            r#"Read the article text below and extract these fields as JSON:
- industry_name (short)
- industry_tactic (short phrase)
- stakeholders (list of key actors/organizations)
- targeted_policy (short phrase, law/policy/issue targeted, if any)
- geographical_focus (country/region/city)
- outcome_impact (1-2 sentence description of likely or actual impact)

Return ONLY valid JSON. No extra commentary.

Article:
{text}"#,
        );

        let raw = self
            .chat
            .complete_json("You are an expert media monitoring analyst.", &prompt)
            .await
            .map_err(|e| BriefwireError::Provider(format!("field extraction: {e}")))?;

        let response: FieldsResponse =
            decode_json(&raw).map_err(|e| BriefwireError::Parse(format!("field extraction: {e}")))?;

        Ok(ExtractedFields {
            industry_name: response.industry_name,
            industry_tactic: response.industry_tactic,
            stakeholders: response.stakeholders.join(),
            targeted_policy: response.targeted_policy,
            geographical_focus: response.geographical_focus,
            outcome_impact: response.outcome_impact,
        })
    }
}
