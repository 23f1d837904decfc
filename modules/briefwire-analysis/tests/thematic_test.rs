// Taxonomy-constrained thematic classification and the taxonomy
// bootstrap generator.

use std::sync::Arc;

use uuid::Uuid;

use briefwire_analysis::testing::{MemoryStore, StubChat};
use briefwire_analysis::{TaxonomyGenerator, ThematicClassifier};
use briefwire_common::Project;

#[tokio::test]
async fn returns_only_identifiers_from_the_supplied_taxonomy() {
    let store = MemoryStore::new();
    let project = store.add_project("Influence watch", "Tracking influence campaigns");
    let policy = store.add_area(project.id, "Policy Manipulation", "Lobbying and policy capture");
    let narratives = store.add_area(project.id, "Public Narratives", "Framing in public media");

    let response = format!(r#"["{}", "{}", "{}"]"#, policy.id, narratives.id, Uuid::new_v4());
    let chat = Arc::new(StubChat::new().respond(&response));
    let classifier = ThematicClassifier::new(chat);

    let areas = vec![policy.clone(), narratives.clone()];
    let matched = classifier
        .classify("The policy debate reshaped the public narrative.", &areas)
        .await;

    assert_eq!(matched, vec![policy.id, narratives.id]);
}

#[tokio::test]
async fn empty_taxonomy_returns_empty_without_a_call() {
    let chat = Arc::new(StubChat::new());
    let classifier = ThematicClassifier::new(chat.clone());

    let matched = classifier.classify("Any article text", &[]).await;

    assert!(matched.is_empty());
    assert_eq!(chat.call_count(), 0);
}

#[tokio::test]
async fn provider_failure_returns_empty() {
    let store = MemoryStore::new();
    let project = store.add_project("Influence watch", "");
    let area = store.add_area(project.id, "Policy Manipulation", "");

    let chat = Arc::new(StubChat::new().fail("rate limited"));
    let classifier = ThematicClassifier::new(chat);

    assert!(classifier.classify("text", &[area]).await.is_empty());
}

#[tokio::test]
async fn unparseable_response_returns_empty() {
    let store = MemoryStore::new();
    let project = store.add_project("Influence watch", "");
    let area = store.add_area(project.id, "Policy Manipulation", "");

    let chat = Arc::new(StubChat::new().respond("The article covers policy, mostly."));
    let classifier = ThematicClassifier::new(chat);

    assert!(classifier.classify("text", &[area]).await.is_empty());
}

#[tokio::test]
async fn taxonomy_generator_parses_fenced_array() {
    let chat = Arc::new(StubChat::new().respond(
        "```json\n[{\"name\": \"Regulation\", \"description\": \"New rules\"}, {\"name\": \"Markets\", \"description\": \"\"}]\n```",
    ));
    let generator = TaxonomyGenerator::new(chat);

    let project = Project {
        id: Uuid::new_v4(),
        title: "Energy brief".to_string(),
        description: "European energy markets".to_string(),
    };

    let areas = generator.generate(&project).await.unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0].name, "Regulation");
    assert_eq!(areas[0].project_id, project.id);
}

#[tokio::test]
async fn taxonomy_generator_surfaces_provider_failure() {
    let chat = Arc::new(StubChat::new().fail("down"));
    let generator = TaxonomyGenerator::new(chat);

    let project = Project {
        id: Uuid::new_v4(),
        title: "Energy brief".to_string(),
        description: String::new(),
    };

    assert!(generator.generate(&project).await.is_err());
}
