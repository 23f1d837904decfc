// Insight synthesis: empty snapshots, structured reports, hard failure
// on malformed responses.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use briefwire_analysis::testing::{MemoryStore, StubChat};
use briefwire_analysis::InsightSynthesizer;
use briefwire_common::{ExtractedFields, ProjectArticleAnalysis};
use briefwire_store::ArticleStore;

fn relevant_analysis(project_id: Uuid, article_id: Uuid) -> ProjectArticleAnalysis {
    ProjectArticleAnalysis {
        id: Uuid::new_v4(),
        media_item_id: article_id,
        project_id,
        relevant: true,
        relevance_confidence: 90,
        relevance_reason: "On brief".to_string(),
        matched_thematic_area_ids: Vec::new(),
        matched_thematic_area_meta: Vec::new(),
        extracted_fields_snapshot: ExtractedFields::default(),
        summary: String::new(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn zero_relevant_articles_writes_empty_snapshot_without_a_call() {
    let store = Arc::new(MemoryStore::new());
    let project = store.add_project("Quiet brief", "Nothing relevant yet");

    let chat = Arc::new(StubChat::new());
    let synthesizer = InsightSynthesizer::new(store.clone(), chat.clone());

    let insight = synthesizer.synthesize_project(project.id).await.unwrap();

    assert!(insight.article_links.is_empty());
    assert_eq!(insight.executive_summary, "");
    assert_eq!(chat.call_count(), 0, "no provider call for an empty corpus");

    let stored = store.latest_insight(project.id).await.unwrap().unwrap();
    assert_eq!(stored.id, insight.id);
}

#[tokio::test]
async fn synthesizes_structured_report_with_article_attribution() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Energy brief", "European energy markets");

    let article = store.add_article(
        source.id,
        "Gas prices surge",
        "Prices rose sharply across European energy markets this week",
        "https://wire.example.com/gas",
    );
    store.link_article(project.id, article.id).await.unwrap();
    store
        .insert_analysis(&relevant_analysis(project.id, article.id))
        .await
        .unwrap();

    let chat = Arc::new(StubChat::new().respond(
        r#"{
            "executive_summary": "Energy prices dominated the week.",
            "topic_clusters": ["pricing"],
            "subthemes": ["supply"],
            "sentiment": {"positive": 0, "negative": 1, "neutral": 0},
            "entities": {"people": [], "organizations": ["EU"], "locations": ["Europe"]},
            "risks": ["Price volatility (https://wire.example.com/gas)"],
            "opportunities": [],
            "recommendations": ["Monitor wholesale markets"],
            "highlights": ["Gas spike covered at https://wire.example.com/gas"]
        }"#,
    ));
    let synthesizer = InsightSynthesizer::new(store.clone(), chat);

    let insight = synthesizer.synthesize_project(project.id).await.unwrap();

    assert_eq!(insight.executive_summary, "Energy prices dominated the week.");
    assert_eq!(insight.article_links, vec!["https://wire.example.com/gas"]);
    assert_eq!(insight.sentiment.negative, 1);
    assert_eq!(insight.entities.organizations, vec!["EU"]);
    assert_eq!(insight.risks.len(), 1);

    let stored = store.latest_insight(project.id).await.unwrap().unwrap();
    assert_eq!(stored.executive_summary, insight.executive_summary);
}

#[tokio::test]
async fn snapshots_append_rather_than_overwrite() {
    let store = Arc::new(MemoryStore::new());
    let project = store.add_project("Quiet brief", "");

    let synthesizer = InsightSynthesizer::new(store.clone(), Arc::new(StubChat::new()));
    synthesizer.synthesize_project(project.id).await.unwrap();
    synthesizer.synthesize_project(project.id).await.unwrap();

    assert_eq!(store.insights_for(project.id).len(), 2);
}

#[tokio::test]
async fn malformed_synthesis_response_is_a_hard_failure() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Energy brief", "");
    let article = store.add_article(
        source.id,
        "Gas prices surge",
        "Prices rose sharply",
        "https://wire.example.com/gas2",
    );
    store
        .insert_analysis(&relevant_analysis(project.id, article.id))
        .await
        .unwrap();

    // Missing the required executive_summary field.
    let chat = Arc::new(StubChat::new().respond(r#"{"topic_clusters": []}"#));
    let synthesizer = InsightSynthesizer::new(store.clone(), chat);

    assert!(synthesizer.synthesize_project(project.id).await.is_err());
    assert!(store.insights_for(project.id).is_empty(), "no partial snapshot");
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let synthesizer = InsightSynthesizer::new(store, Arc::new(StubChat::new()));

    assert!(synthesizer.synthesize_project(Uuid::new_v4()).await.is_err());
}
