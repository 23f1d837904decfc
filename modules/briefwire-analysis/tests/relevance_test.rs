// Staged relevance decision: triviality filter, similarity gate,
// adjudication fail-open.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use briefwire_analysis::testing::{FailingEmbedder, FixedEmbedder, StubChat};
use briefwire_analysis::RelevanceClassifier;
use briefwire_common::{AnalysisStatus, Article, ExtractedFields, Project};

const THRESHOLD: f32 = 0.38;

fn project(title: &str, description: &str) -> Project {
    Project {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: description.to_string(),
    }
}

fn article(title: &str, body: &str) -> Article {
    Article {
        id: Uuid::new_v4(),
        source_id: Uuid::new_v4(),
        raw_title: title.to_string(),
        raw_text: body.to_string(),
        url: "https://news.example.com/story".to_string(),
        published_at: None,
        scraped_at: Utc::now(),
        fields: ExtractedFields::default(),
        analysis_status: AnalysisStatus::Raw,
    }
}

#[tokio::test]
async fn empty_article_rejected_without_any_external_call() {
    let chat = Arc::new(StubChat::new());
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat.clone(), embedder.clone(), THRESHOLD);

    let outcome = classifier
        .classify(&project("Solar policy", "Coverage of solar policy"), &article("", "  "))
        .await;

    assert!(!outcome.relevant);
    assert_eq!(outcome.similarity, None);
    assert_eq!(chat.call_count(), 0);
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn below_threshold_rejects_without_adjudication() {
    let chat = Arc::new(StubChat::new());
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat.clone(), embedder.clone(), THRESHOLD);

    // Completely disjoint vocabularies: bag-of-words cosine is 0.
    let outcome = classifier
        .classify(
            &project("Solar energy policy", "Legislation affecting photovoltaic subsidies"),
            &article("Playoffs tonight", "Basketball finals tip off downtown"),
        )
        .await;

    assert!(!outcome.relevant);
    let similarity = outcome.similarity.expect("similarity stage ran");
    assert!(similarity < THRESHOLD);
    assert_eq!(chat.call_count(), 0, "adjudicator must not be invoked");
    assert_eq!(embedder.call_count(), 2);
}

#[tokio::test]
async fn above_threshold_accepts_on_positive_verdict() {
    let chat = Arc::new(
        StubChat::new()
            .respond(r#"{"relevant": true, "confidence": 88, "reason": "Directly about solar policy"}"#),
    );
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat.clone(), embedder, THRESHOLD);

    let outcome = classifier
        .classify(
            &project("Solar energy policy", "solar panels and energy policy"),
            &article("Solar energy policy expands", "New solar panels and energy policy funding"),
        )
        .await;

    assert!(outcome.relevant);
    assert_eq!(outcome.confidence, 88);
    assert_eq!(outcome.reason, "Directly about solar policy");
    assert!(outcome.similarity.expect("similarity stage ran") >= THRESHOLD);
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn adjudicator_failure_fails_open() {
    let chat = Arc::new(StubChat::new().fail("provider timeout"));
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat, embedder, THRESHOLD);

    let outcome = classifier
        .classify(
            &project("Solar energy policy", "solar panels and energy policy"),
            &article("Solar energy policy expands", "New solar panels and energy policy funding"),
        )
        .await;

    assert!(outcome.relevant, "provider failure must fail open");
    assert_eq!(outcome.confidence, 50);
    assert!(outcome.reason.contains("defaulted to relevant"));
}

#[tokio::test]
async fn unparseable_verdict_fails_open() {
    let chat = Arc::new(StubChat::new().respond("I think it is probably relevant, yes."));
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat, embedder, THRESHOLD);

    let outcome = classifier
        .classify(
            &project("Solar energy policy", "solar panels and energy policy"),
            &article("Solar energy policy expands", "New solar panels and energy policy funding"),
        )
        .await;

    assert!(outcome.relevant);
    assert!(outcome.reason.contains("unparseable"));
}

#[tokio::test]
async fn embedding_failure_degrades_to_adjudication() {
    // The similarity gate opens rather than dropping the pair.
    let chat = Arc::new(
        StubChat::new().respond(r#"{"relevant": false, "confidence": 95, "reason": "Off topic"}"#),
    );
    let classifier = RelevanceClassifier::new(chat.clone(), Arc::new(FailingEmbedder), THRESHOLD);

    let outcome = classifier
        .classify(
            &project("Solar energy policy", "photovoltaic subsidies"),
            &article("Playoffs tonight", "Basketball finals tip off downtown"),
        )
        .await;

    assert_eq!(outcome.similarity, None);
    assert_eq!(chat.call_count(), 1, "adjudicator decides when embeddings are down");
    assert!(!outcome.relevant);
}

#[tokio::test]
async fn keyword_match_is_diagnostic_only() {
    let chat = Arc::new(
        StubChat::new().respond(r#"{"relevant": true, "confidence": 70, "reason": "Mentions the brief"}"#),
    );
    let embedder = Arc::new(FixedEmbedder::new());
    let classifier = RelevanceClassifier::new(chat, embedder, THRESHOLD);

    let outcome = classifier
        .classify(
            &project("solar panels", "solar panels everywhere"),
            &article("About solar panels", "solar panels on every roof"),
        )
        .await;

    assert!(outcome.keyword_match);
    assert!(outcome.relevant);
}
