use std::collections::HashSet;
use std::sync::Arc;

use ai_client::util::decode_json;
use tracing::warn;
use uuid::Uuid;

use briefwire_common::ThematicArea;

use crate::traits::ChatModel;

/// Assigns zero or more of a project's thematic areas to an article.
///
/// Classification is best-effort: any provider or parse failure yields an
/// empty set rather than an error, and the answer is constrained to
/// identifiers drawn from the supplied taxonomy, so the model cannot
/// invent areas.
pub struct ThematicClassifier {
    chat: Arc<dyn ChatModel>,
}

impl ThematicClassifier {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    pub async fn classify(&self, article_text: &str, areas: &[ThematicArea]) -> Vec<Uuid> {
        if areas.is_empty() {
            return Vec::new();
        }

        let themes_text: Vec<String> = areas
            .iter()
            .map(|t| format!("- {} — {}: {}", t.id, t.name, t.description))
            .collect();

        let prompt = format!(
            r#"Analyze the article and determine which thematic areas it belongs to.

Return ONLY a JSON array of IDs.

Themes:
{themes}

Article:
{article_text}

Respond ONLY in strict JSON:
["theme_id_1", "theme_id_3"]"#,
            themes = themes_text.join("\n"),
        );

        let raw = match self
            .chat
            .complete("You classify articles into thematic areas.", &prompt)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Theme classification call failed, returning no matches");
                return Vec::new();
            }
        };

        let ids: Vec<String> = match decode_json(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Unparseable theme classification response, returning no matches");
                return Vec::new();
            }
        };

        let known: HashSet<Uuid> = areas.iter().map(|a| a.id).collect();

        ids.iter()
            .filter_map(|raw_id| match raw_id.parse::<Uuid>() {
                Ok(id) if known.contains(&id) => Some(id),
                Ok(id) => {
                    warn!(%id, "Model returned a thematic area outside the taxonomy, dropping");
                    None
                }
                Err(_) => {
                    warn!(raw_id = %raw_id, "Model returned a malformed thematic area id, dropping");
                    None
                }
            })
            .collect()
    }
}
