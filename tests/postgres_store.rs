//! Postgres adapters against a live database. Run with
//! `DATABASE_URL=postgres://… cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use portico::application::repos::{
    CreateEntryParams, CreateSocialLinkParams, EntriesRepo, RepoError, SocialLinksRepo,
};
use portico::cache::{CacheConfig, Clock, ManualClock, Module, SnapshotState, SnapshotStore};
use portico::infra::db::{PostgresRepositories, PostgresSnapshotStore};
use serde_json::json;
use sqlx::PgPool;

fn store(pool: PgPool, clock: Arc<ManualClock>) -> PostgresSnapshotStore {
    let repos = PostgresRepositories::new(pool);
    PostgresSnapshotStore::new(
        &repos,
        Arc::new(CacheConfig::with_uniform_ttl(Duration::from_secs(60))),
        clock,
    )
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn put_replaces_snapshot_and_invalidate_keeps_payload(pool: PgPool) {
    let clock = Arc::new(ManualClock::at_epoch());
    let store = store(pool, clock.clone());

    store
        .put(Module::Services, json!({ "cards": [1] }), "first".into())
        .await
        .expect("first put");
    clock.advance(Duration::from_secs(10));
    let second = store
        .put(Module::Services, json!({ "cards": [1, 2] }), "second".into())
        .await
        .expect("second put");
    assert_eq!(second.created_at.unix_timestamp(), 10);
    assert_eq!(second.expires_at.unix_timestamp(), 70);

    store.invalidate(Module::Services).await.expect("invalidate");
    let snapshot = store
        .get(Module::Services)
        .await
        .expect("get")
        .expect("still present");
    assert_eq!(snapshot.payload, json!({ "cards": [1, 2] }));
    assert_eq!(snapshot.checksum, "second");
    assert_eq!(snapshot.state_at(clock.now()), SnapshotState::Stale);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn invalidating_absent_module_is_a_no_op(pool: PgPool) {
    let store = store(pool, Arc::new(ManualClock::at_epoch()));

    store.invalidate(Module::Tenders).await.expect("invalidate");
    assert!(store.get(Module::Tenders).await.expect("get").is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn social_link_platforms_are_unique(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let links: &dyn SocialLinksRepo = &repos;
    let params = CreateSocialLinkParams {
        platform: "facebook".into(),
        url: "https://facebook.com/utility".into(),
        sort_order: 0,
        visible: true,
    };

    links.create(params.clone()).await.expect("first insert");
    let err = links.create(params).await.expect_err("duplicate");
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn published_entries_respect_limit_and_module(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let entries: &dyn EntriesRepo = &repos;
    for (module, title, position) in [
        (Module::News, "second", 2),
        (Module::News, "first", 1),
        (Module::Faq, "other", 0),
    ] {
        entries
            .create(CreateEntryParams {
                module,
                title: title.into(),
                body: json!({}),
                position,
                published: true,
            })
            .await
            .expect("create");
    }

    let news = entries
        .list_published(Module::News, Some(1))
        .await
        .expect("list");
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].title, "first");
}
