// Per-article pipeline: global extraction once, per-project analysis
// rows, policy application.

use std::sync::Arc;

use uuid::Uuid;

use briefwire_analysis::testing::{FixedEmbedder, MemoryStore, StubChat};
use briefwire_analysis::AnalysisPipeline;
use briefwire_common::{AnalysisStatus, RelevancePolicy};
use briefwire_store::ArticleStore;

const THRESHOLD: f32 = 0.38;

fn pipeline(
    store: Arc<MemoryStore>,
    chat: Arc<StubChat>,
    policy: RelevancePolicy,
) -> AnalysisPipeline {
    AnalysisPipeline::new(
        store,
        chat,
        Arc::new(FixedEmbedder::new()),
        THRESHOLD,
        policy,
    )
}

#[tokio::test]
async fn processes_article_end_to_end_for_one_project() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project(
        "Influence watch",
        "policy narrative influence media coverage",
    );
    let policy_area = store.add_area(project.id, "Policy Manipulation", "Policy capture");
    let narrative_area = store.add_area(project.id, "Public Narratives", "Media framing");

    let article = store.add_article(
        source.id,
        "Policy narrative shifts",
        "Extensive policy influence coverage reshaping the public narrative in media",
        "https://wire.example.com/a1",
    );
    store.link_article(project.id, article.id).await.unwrap();

    // Call order: field extraction, adjudication, theme classification.
    let chat = Arc::new(
        StubChat::new()
            .respond(r#"{"industry_name": "Energy", "industry_tactic": "Lobbying", "stakeholders": ["Shell", "Greenpeace"]}"#)
            .respond(r#"{"relevant": true, "confidence": 90, "reason": "On brief"}"#)
            .respond(&format!(r#"["{}", "{}"]"#, policy_area.id, narrative_area.id)),
    );

    let report = pipeline(store.clone(), chat, RelevancePolicy::Adjudicated)
        .process_article(article.id)
        .await
        .unwrap();

    assert_eq!(report.fields.industry_name, "Energy");
    assert_eq!(report.fields.stakeholders, "Shell, Greenpeace");
    assert_eq!(report.projects.len(), 1);
    assert!(report.projects[0].relevant);
    assert_eq!(report.projects[0].matched_areas.len(), 2);

    // The article advanced to extracted with the fields persisted.
    let stored = store.get_article(article.id).await.unwrap().unwrap();
    assert_eq!(stored.analysis_status, AnalysisStatus::Extracted);
    assert_eq!(stored.fields.industry_name, "Energy");

    // One analysis row, carrying themes, snapshot, and a summary.
    let analyses = store.analyses_for(project.id);
    assert_eq!(analyses.len(), 1);
    assert!(analyses[0].relevant);
    assert_eq!(
        analyses[0].matched_thematic_area_ids,
        vec![policy_area.id, narrative_area.id]
    );
    assert_eq!(analyses[0].extracted_fields_snapshot.industry_name, "Energy");
    assert!(analyses[0].summary.contains("Policy Manipulation"));

    // Latest-analysis and analysed-articles read models see the same row.
    let latest = store
        .latest_analysis(project.id, article.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, analyses[0].id);

    let analysed = store.analysed_articles(project.id).await.unwrap();
    assert_eq!(analysed.len(), 1);
    assert!(analysed[0].relevant);
    assert_eq!(analysed[0].fields.industry_name, "Energy");
    assert_eq!(analysed[0].matched_thematic_areas[0].name, "Policy Manipulation");
}

#[tokio::test]
async fn omitted_fields_default_to_empty_strings() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Influence watch", "policy influence coverage");
    let article = store.add_article(
        source.id,
        "Policy influence coverage",
        "Long form report about policy influence coverage and its reach into media",
        "https://wire.example.com/a2",
    );
    store.link_article(project.id, article.id).await.unwrap();

    let chat = Arc::new(
        StubChat::new()
            .respond(r#"{"industry_name": "Energy"}"#)
            .respond(r#"{"relevant": true, "confidence": 75, "reason": "Related"}"#),
    );

    let report = pipeline(store, chat, RelevancePolicy::Adjudicated)
        .process_article(article.id)
        .await
        .unwrap();

    assert_eq!(report.fields.industry_name, "Energy");
    assert_eq!(report.fields.industry_tactic, "");
    assert_eq!(report.fields.stakeholders, "");
    assert_eq!(report.fields.outcome_impact, "");
}

#[tokio::test]
async fn hybrid_policy_requires_a_thematic_match() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Influence watch", "policy influence coverage");
    store.add_area(project.id, "Policy Manipulation", "Policy capture");

    let article = store.add_article(
        source.id,
        "Policy influence coverage",
        "Long form report about policy influence coverage and its reach into media",
        "https://wire.example.com/a3",
    );
    store.link_article(project.id, article.id).await.unwrap();

    // Adjudicator says yes, but no thematic area matches.
    let chat = Arc::new(
        StubChat::new()
            .respond("{}")
            .respond(r#"{"relevant": true, "confidence": 80, "reason": "Related"}"#)
            .respond("[]"),
    );

    let report = pipeline(store.clone(), chat, RelevancePolicy::Hybrid)
        .process_article(article.id)
        .await
        .unwrap();

    assert!(!report.projects[0].relevant, "hybrid demands a theme match");
    let analyses = store.analyses_for(project.id);
    assert!(!analyses[0].relevant);
}

#[tokio::test]
async fn extraction_failure_is_a_hard_failure() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Influence watch", "policy influence coverage");
    let article = store.add_article(
        source.id,
        "Policy influence coverage",
        "Long form report about policy influence coverage and its reach into media",
        "https://wire.example.com/a4",
    );
    store.link_article(project.id, article.id).await.unwrap();

    let chat = Arc::new(StubChat::new().fail("extraction provider down"));

    let result = pipeline(store.clone(), chat, RelevancePolicy::Adjudicated)
        .process_article(article.id)
        .await;

    assert!(result.is_err());
    let stored = store.get_article(article.id).await.unwrap().unwrap();
    assert_eq!(stored.analysis_status, AnalysisStatus::Raw);
    assert!(store.analyses_for(project.id).is_empty());
}

#[tokio::test]
async fn unknown_article_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let chat = Arc::new(StubChat::new());

    let result = pipeline(store, chat, RelevancePolicy::Adjudicated)
        .process_article(Uuid::new_v4())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn unlinked_article_is_a_validation_error() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let article = store.add_article(
        source.id,
        "Orphan",
        "No project ever subscribed to this one",
        "https://wire.example.com/a5",
    );

    let chat = Arc::new(StubChat::new());
    let result = pipeline(store, chat, RelevancePolicy::Adjudicated)
        .process_article(article.id)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn irrelevant_article_skips_theme_classification() {
    let store = Arc::new(MemoryStore::new());
    let source = store.add_source("Wire", "https://wire.example.com/rss");
    let project = store.add_project("Solar energy policy", "photovoltaic subsidies legislation");
    store.add_area(project.id, "Policy Manipulation", "Policy capture");

    // Disjoint vocabulary: similarity gate rejects before adjudication.
    let article = store.add_article(
        source.id,
        "Playoffs tonight",
        "Basketball finals tip off downtown with record attendance expected",
        "https://wire.example.com/a6",
    );
    store.link_article(project.id, article.id).await.unwrap();

    let chat = Arc::new(StubChat::new().respond("{}"));

    let report = pipeline(store.clone(), chat.clone(), RelevancePolicy::Adjudicated)
        .process_article(article.id)
        .await
        .unwrap();

    assert!(!report.projects[0].relevant);
    assert!(report.projects[0].matched_areas.is_empty());
    // Only the field extraction call happened.
    assert_eq!(chat.call_count(), 1);
}
