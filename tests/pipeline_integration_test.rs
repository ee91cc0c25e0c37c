use chrono::{NaiveDate, Utc};
use httpmock::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tourney_etl::core::{ScrapedDocument, TournamentStore};
use tourney_etl::domain::model::{RejectReason, Sport, TournamentQuery};
use tourney_etl::{
    ConsolidationEngine, ConsolidationPipeline, FieldExtractor, HttpExtractionService,
    JsonFileStore, MemoryStore,
};

fn document(url: &str, text: &str) -> ScrapedDocument {
    ScrapedDocument {
        source_url: url.to_string(),
        raw_text: text.to_string(),
        fetched_at: Utc::now(),
    }
}

fn pipeline_against(
    server: &MockServer,
) -> ConsolidationPipeline<HttpExtractionService> {
    let service = HttpExtractionService::new(&server.url("/extract"), 5).unwrap();
    let extractor = FieldExtractor::new(Arc::new(service), 2)
        .with_backoff(Duration::from_millis(1));
    ConsolidationPipeline::new(extractor, 3, 0.7)
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

fn mock_extraction(server: &MockServer, source_url: &str, body: serde_json::Value) {
    server.mock(|when, then| {
        when.method(POST)
            .path("/extract")
            .json_body_partial(format!(r#"{{"source_url": "{}"}}"#, source_url));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(body);
    });
}

#[tokio::test]
async fn test_end_to_end_run_consolidates_and_stores() {
    let server = MockServer::start();

    mock_extraction(
        &server,
        "https://a.example/cup",
        serde_json::json!({
            "name": "City Cup",
            "sport": "Football",
            "level": "School",
            "date_info": ["2025-07-12"],
            "venue": ["Main Ground"],
            "summary": "Announcement A",
            "confidence_score": 0.8
        }),
    );
    mock_extraction(
        &server,
        "https://b.example/cup",
        serde_json::json!({
            "name": "city cup",
            "sport": "Football",
            "level": "School",
            "date_info": ["2025-07-12"],
            "registration_deadline": "2025-06-20",
            "venue": ["Main Ground"],
            "summary": "Announcement B",
            "confidence_score": 0.9
        }),
    );
    mock_extraction(
        &server,
        "https://c.example/run",
        serde_json::json!({
            "name": "River Run",
            "sport": "Running",
            "level": "City",
            "date_info": ["2025-05-01"],
            "venue": ["Riverside"],
            "summary": "Already happened",
            "confidence_score": 0.95
        }),
    );
    // Below the acceptance threshold: extracted but rejected.
    mock_extraction(
        &server,
        "https://d.example/weak",
        serde_json::json!({
            "name": "Faint Signal Cup",
            "sport": "Cricket",
            "level": "District",
            "confidence_score": 0.5
        }),
    );
    // Permanent failure: burns the whole retry budget.
    let failing = server.mock(|when, then| {
        when.method(POST)
            .path("/extract")
            .json_body_partial(r#"{"source_url": "https://e.example/down"}"#);
        then.status(500);
    });

    let store = MemoryStore::new();
    let engine = ConsolidationEngine::new(pipeline_against(&server), store.clone());

    let documents = vec![
        document("https://a.example/cup", "city cup page"),
        document("https://b.example/cup", "city cup mirror"),
        document("https://c.example/run", "river run page"),
        document("https://d.example/weak", "vague page"),
        document("https://e.example/down", "broken page"),
    ];

    let report = engine.run(documents).await.unwrap();

    let summary = &report.summary;
    assert_eq!(summary.documents_in, 5);
    assert_eq!(summary.extracted, 4);
    assert_eq!(summary.rejections(RejectReason::LowConfidence), 1);
    assert_eq!(summary.rejections(RejectReason::ExtractionServiceError), 1);
    assert_eq!(summary.duplicates_merged, 1);
    assert_eq!(summary.final_count, 2);
    assert_eq!(report.upserts.inserted, 2);

    // One initial call plus two retries for the failing document.
    failing.assert_hits(3);

    // The merged City Cup kept the higher-confidence base and gained the
    // deadline and both sources.
    let records = store.snapshot().await;
    let city_cup = records.iter().find(|r| r.sport == Sport::Football).unwrap();
    assert_eq!(city_cup.confidence_score, 0.9);
    assert_eq!(city_cup.registration_deadline.as_deref(), Some("2025-06-20"));
    assert_eq!(
        city_cup.normalized_deadline_date,
        NaiveDate::from_ymd_opt(2025, 6, 20)
    );
    assert_eq!(city_cup.sources.len(), 2);
    assert!(!city_cup.is_past);

    // The past event is persisted but flagged.
    let river_run = records.iter().find(|r| r.sport == Sport::Running).unwrap();
    assert!(river_run.is_past);
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent_in_the_file_store() {
    let server = MockServer::start();
    mock_extraction(
        &server,
        "https://a.example/open",
        serde_json::json!({
            "name": "Lakeside Open",
            "sport": "Swimming",
            "level": "State",
            "date_info": ["2025-09-14"],
            "venue": ["Lakeside Pool"],
            "summary": "State qualifier",
            "confidence_score": 0.9
        }),
    );

    let dir = tempfile::TempDir::new().unwrap();
    let base = dir.path().to_str().unwrap();
    let documents = vec![document("https://a.example/open", "lakeside open page")];

    let first = ConsolidationEngine::new(
        pipeline_against(&server),
        JsonFileStore::new(base),
    )
    .run(documents.clone())
    .await
    .unwrap();
    assert_eq!(first.upserts.inserted, 1);
    assert_eq!(first.upserts.updated, 0);

    // Same batch again: the natural key matches, nothing new is inserted.
    let second = ConsolidationEngine::new(
        pipeline_against(&server),
        JsonFileStore::new(base),
    )
    .run(documents)
    .await
    .unwrap();
    assert_eq!(second.upserts.inserted, 0);
    assert_eq!(second.upserts.updated, 1);

    // Query with past included: the store re-evaluates past/future against
    // the real clock, not the pinned pipeline date.
    let store = JsonFileStore::new(base);
    let records = store
        .query(&TournamentQuery {
            include_past: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Lakeside Open");
}

#[tokio::test]
async fn test_whole_batch_failure_still_completes_with_empty_result() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/extract");
        then.status(503);
    });

    let store = MemoryStore::new();
    let engine = ConsolidationEngine::new(pipeline_against(&server), store.clone());
    let report = engine
        .run(vec![
            document("https://a.example", "page a"),
            document("https://b.example", "page b"),
        ])
        .await
        .unwrap();

    assert_eq!(report.summary.final_count, 0);
    assert_eq!(
        report.summary.rejections(RejectReason::ExtractionServiceError),
        2
    );
    assert!(store.is_empty().await);
}
