use std::sync::Arc;

use ai_client::util::decode_json;
use serde::Deserialize;
use uuid::Uuid;

use briefwire_common::{BriefwireError, Project, ThematicArea};

use crate::traits::ChatModel;

const AREA_COUNT: usize = 5;

#[derive(Debug, Deserialize)]
struct GeneratedArea {
    name: String,
    #[serde(default)]
    description: String,
}

/// Generates a starter thematic taxonomy for a freshly created project.
/// Setup-time tooling, not a pipeline stage: failures surface to the
/// caller instead of degrading.
pub struct TaxonomyGenerator {
    chat: Arc<dyn ChatModel>,
}

impl TaxonomyGenerator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    pub async fn generate(&self, project: &Project) -> anyhow::Result<Vec<ThematicArea>> {
        let prompt = format!(
            r#"Generate {AREA_COUNT} thematic areas for a media monitoring project.

PROJECT TITLE:
{title}

PROJECT DESCRIPTION:
{description}

Return CLEAN JSON in this format:

[
  {{
    "name": "",
    "description": ""
  }}
]"#,
            title = project.title,
            description = project.description,
        );

        let raw = self
            .chat
            .complete("You design media monitoring taxonomies.", &prompt)
            .await
            .map_err(|e| BriefwireError::Provider(format!("taxonomy generation: {e}")))?;

        let areas: Vec<GeneratedArea> = decode_json(&raw)
            .map_err(|e| BriefwireError::Parse(format!("taxonomy generation: {e}")))?;

        Ok(areas
            .into_iter()
            .map(|a| ThematicArea {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: a.name,
                description: a.description,
            })
            .collect())
    }
}
