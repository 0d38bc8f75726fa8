use std::path::PathBuf;
use std::time::Duration;

use habita::{
    CatalogError, EmbedError, EmbedderMode, HabitaConfig, ListingDraft, RankError, SearchRequest,
    SearchStack, StackError,
};
use semantic::retry::RetryConfig;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn draft() -> ListingDraft {
    ListingDraft {
        tenant_id: Uuid::nil(),
        title: "Apartamento 2 quartos".into(),
        description: "Perto do metro".into(),
        neighborhood: "Centro".into(),
        city: "Belo Horizonte".into(),
        region: "MG".into(),
        bedrooms: 2,
        bathrooms: 1,
        price: 300_000.0,
        area: 60.0,
    }
}

/// Api embedder pointed at a closed local port.
fn unreachable_embedder_config() -> HabitaConfig {
    let mut cfg = HabitaConfig::default();
    cfg.embedder.mode = EmbedderMode::Api;
    cfg.embedder.api_url = Some("http://127.0.0.1:9/v1/embeddings".into());
    cfg.embedder.timeout = Duration::from_millis(500);
    cfg.embedder.retry = RetryConfig::none();
    cfg
}

#[tokio::test]
async fn blank_query_is_a_validation_error() {
    let stack = SearchStack::from_config(&HabitaConfig::default()).unwrap();
    for query in ["", "   ", "\n\t"] {
        let err = stack
            .search(&SearchRequest::new(query), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RankError::Validation(_)), "query {query:?}");
    }
}

#[tokio::test]
async fn nan_price_is_a_validation_error() {
    let stack = SearchStack::from_config(&HabitaConfig::default()).unwrap();
    let err = stack
        .search(
            &SearchRequest::new("casa").with_max_price(f64::NAN),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::Validation(_)));
}

#[test]
fn invalid_ranking_config_fails_stack_construction() {
    let mut cfg = HabitaConfig::default();
    cfg.ranking.semantic_weight = 0.9;
    let result = SearchStack::from_config(&cfg);
    assert!(matches!(result, Err(StackError::Ranking(RankError::Validation(_)))));
}

#[test]
fn invalid_embedder_config_fails_stack_construction() {
    let mut cfg = HabitaConfig::default();
    cfg.embedder.mode = EmbedderMode::Api;
    let result = SearchStack::from_config(&cfg);
    assert!(matches!(result, Err(StackError::Embedder(EmbedError::InvalidConfig(_)))));
}

#[test]
fn missing_seed_file_is_reported() {
    let mut cfg = HabitaConfig::default();
    cfg.catalog.seed_path = Some(PathBuf::from("/nonexistent/habita/listings.json"));
    let result = SearchStack::from_config(&cfg);
    assert!(matches!(result, Err(StackError::Catalog(CatalogError::Seed { .. }))));
}

#[test]
fn malformed_seed_file_is_reported() {
    let seed = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(seed.path(), b"{ not json").unwrap();
    let mut cfg = HabitaConfig::default();
    cfg.catalog.seed_path = Some(seed.path().to_path_buf());
    let result = SearchStack::from_config(&cfg);
    assert!(matches!(result, Err(StackError::Catalog(CatalogError::Decode(_)))));
}

#[tokio::test]
async fn unreachable_embedder_makes_search_unavailable() {
    let stack = SearchStack::from_config(&unreachable_embedder_config()).unwrap();
    let err = stack
        .search(&SearchRequest::new("casa"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::EmbeddingUnavailable(EmbedError::Transport(_))));
}

#[tokio::test]
async fn unreachable_embedder_rejects_new_listings() {
    let stack = SearchStack::from_config(&unreachable_embedder_config()).unwrap();
    let err = stack
        .add_listing(draft(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StackError::Embedder(EmbedError::Transport(_))));
    assert!(stack.catalog.is_empty());
}

#[tokio::test]
async fn cancelled_insert_reports_cancellation() {
    let stack = SearchStack::from_config(&HabitaConfig::default()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = stack.add_listing(draft(), &cancel).await.unwrap_err();
    assert!(matches!(err, StackError::Embedder(EmbedError::Cancelled)));
}
