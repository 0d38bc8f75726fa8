use std::io::Write;
use std::sync::Arc;

use habita::{
    HabitaConfig, InMemoryCatalog, ListingDraft, Scope, SearchMode, SearchRequest, SearchStack,
    StubEmbedder, TenantId,
};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn draft(tenant_id: TenantId, title: &str, neighborhood: &str, bedrooms: u32, price: f64) -> ListingDraft {
    ListingDraft {
        tenant_id,
        title: title.into(),
        description: format!("{title} em {neighborhood}, pronto para morar"),
        neighborhood: neighborhood.into(),
        city: "Belo Horizonte".into(),
        region: "MG".into(),
        bedrooms,
        bathrooms: 1,
        price,
        area: 45.0 + bedrooms as f64 * 20.0,
    }
}

async fn seeded_stack() -> SearchStack {
    let stack = SearchStack::from_config(&HabitaConfig::default()).expect("stack");
    let cancel = CancellationToken::new();
    let tenant = Uuid::nil();
    for d in [
        draft(tenant, "Apartamento 2 quartos perto do metro", "Centro", 2, 320_000.0),
        draft(tenant, "Kitnet mobiliada", "Centro", 1, 180_000.0),
        draft(tenant, "Cobertura com piscina", "Savassi", 4, 1_900_000.0),
        draft(tenant, "Casa com quintal", "Pampulha", 3, 750_000.0),
        draft(tenant, "Apartamento 3 quartos com varanda", "Funcionarios", 3, 890_000.0),
        draft(tenant, "Apartamento 2 quartos reformado", "Centro", 2, 410_000.0),
    ] {
        stack.add_listing(d, &cancel).await.expect("add listing");
    }
    stack
}

#[tokio::test]
async fn structured_search_prefers_matching_neighborhood() {
    let stack = seeded_stack().await;
    let request = SearchRequest::new("apartamento 2 quartos")
        .with_neighborhood("centro")
        .with_max_price(400_000.0)
        .with_limit(10);

    let ranked = stack
        .search(&request, &CancellationToken::new())
        .await
        .expect("search");

    assert_eq!(ranked.mode, SearchMode::Structured);
    assert!(!ranked.is_empty());
    for hit in &ranked {
        assert!(hit.listing.neighborhood.eq_ignore_ascii_case("centro"));
        assert!(hit.listing.price <= 400_000.0);
        assert!(hit.similarity >= 0.06);
    }
    assert!(ranked.hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn pure_semantic_search_finds_the_described_listing() {
    let stack = seeded_stack().await;
    let target = draft(Uuid::nil(), "Cobertura com piscina", "Savassi", 4, 1_900_000.0);

    let ranked = stack
        .search(
            &SearchRequest::new(target.embedding_text()),
            &CancellationToken::new(),
        )
        .await
        .expect("search");

    assert_eq!(ranked.mode, SearchMode::PureSemantic);
    assert_eq!(ranked.pool_size, 6);
    assert_eq!(ranked.hits[0].listing.title, "Cobertura com piscina");
    assert!(ranked.hits[0].similarity > 0.99);
    assert_eq!(ranked.hits[0].score, ranked.hits[0].similarity);
}

#[tokio::test]
async fn tenant_scope_hides_other_tenants() {
    let stack = SearchStack::from_config(&HabitaConfig::default()).expect("stack");
    let cancel = CancellationToken::new();
    let ours = Uuid::new_v4();
    let theirs = Uuid::new_v4();
    stack
        .add_listing(draft(ours, "Apartamento nosso", "Centro", 2, 300_000.0), &cancel)
        .await
        .unwrap();
    stack
        .add_listing(draft(theirs, "Apartamento deles", "Centro", 2, 300_000.0), &cancel)
        .await
        .unwrap();

    for request in [
        SearchRequest::new("apartamento"),
        SearchRequest::new("apartamento").with_neighborhood("Centro"),
    ] {
        let ranked = stack
            .search(&request.with_scope(Scope::Tenant(ours)), &cancel)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked.hits[0].listing.tenant_id, ours);
    }
}

#[tokio::test]
async fn stack_loads_seed_file_from_config() {
    let embedder = StubEmbedder::default();
    let listings: Vec<_> = [
        draft(Uuid::nil(), "Apartamento 2 quartos", "Centro", 2, 300_000.0),
        draft(Uuid::nil(), "Casa 3 quartos", "Pampulha", 3, 600_000.0),
    ]
    .into_iter()
    .map(|d| {
        let embedding = embedder.embed_sync(&d.embedding_text());
        d.into_listing(embedding)
    })
    .collect();

    let mut seed = NamedTempFile::new().unwrap();
    seed.write_all(&serde_json::to_vec(&listings).unwrap()).unwrap();

    let yaml = format!(
        "version: \"1.0\"\ncatalog:\n  seed_path: \"{}\"\n",
        seed.path().display()
    );
    let cfg = HabitaConfig::from_yaml(&yaml).unwrap();
    let stack = SearchStack::from_config(&cfg).unwrap();
    assert_eq!(stack.catalog.len(), 2);

    let ranked = stack
        .search(
            &SearchRequest::new("casa").with_min_bedrooms(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked.hits[0].listing.neighborhood, "Pampulha");
}

#[tokio::test]
async fn stack_can_wrap_an_existing_catalog() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let stack = SearchStack::with_catalog(&HabitaConfig::default(), catalog.clone()).unwrap();
    let id = stack
        .add_listing(
            draft(Uuid::nil(), "Loft industrial", "Lourdes", 1, 500_000.0),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(catalog.len(), 1);
    let stored = catalog.get(&id).unwrap().expect("stored listing");
    assert!(stored.has_embedding());
    assert_eq!(stored.region, "MG");
}
