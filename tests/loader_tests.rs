//! Incremental batches against in-memory fixtures

mod common;

use std::collections::HashSet;

use common::*;
use pokedex::action::Action;
use pokedex::api::index_url;
use pokedex::effect::Effect;
use pokedex::error::FetchError;
use pokedex::loader::batch_action;
use pokedex::reducer::reducer;
use pokedex::state::{AppState, BatchRequest, LoaderPhase, LoaderState};

#[tokio::test]
async fn partial_failures_still_advance_by_the_batch_size() {
    let source = FixtureSource::new();
    let references: Vec<_> = (1..=5)
        .map(|id| source.add_pokemon(id, &format!("mon-{id}")))
        .collect();
    source.add_index(0, 5, &references);
    source.fail(species_url(2));
    source.fail(encounters_url(4));

    let catalog = catalog(&source);
    let mut loader = LoaderState::new(5);
    let request = loader.begin_fetch().expect("idle loader fetches");
    let outcome = catalog.fetch_batch(request).await.expect("batch loads");

    assert_eq!(outcome.reference_count, 5);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.entries.len(), 3);

    assert!(loader.complete(outcome));
    assert_eq!(loader.cursor, 5);
    assert_eq!(loader.items.len(), 3);
    assert_eq!(loader.phase, LoaderPhase::Idle);
    assert!(loader.has_more);
}

#[tokio::test]
async fn consecutive_batches_keep_ids_unique() {
    let source = FixtureSource::new();
    let first: Vec<_> = (1..=3)
        .map(|id| source.add_pokemon(id, &format!("mon-{id}")))
        .collect();
    let second: Vec<_> = (3..=5)
        .map(|id| source.add_pokemon(id, &format!("mon-{id}")))
        .collect();
    source.add_index(0, 3, &first);
    source.add_index(3, 3, &second);

    let catalog = catalog(&source);
    let mut loader = LoaderState::new(3);
    for _ in 0..2 {
        let request = loader.begin_fetch().expect("idle loader fetches");
        let outcome = catalog.fetch_batch(request).await.expect("batch loads");
        loader.complete(outcome);
    }

    let ids: HashSet<u32> = loader.items.iter().map(|entry| entry.id).collect();
    assert_eq!(ids.len(), loader.items.len());
    assert_eq!(ids.len(), 5);
    assert_eq!(loader.cursor, 6);
}

#[tokio::test]
async fn empty_page_exhausts_the_loader() {
    let source = FixtureSource::new();
    source.add_index(0, 5, &[]);

    let catalog = catalog(&source);
    let mut loader = LoaderState::new(5);
    let request = loader.begin_fetch().expect("idle loader fetches");
    let outcome = catalog.fetch_batch(request).await.expect("batch loads");

    assert_eq!(outcome.reference_count, 0);
    assert!(loader.complete(outcome));
    assert!(!loader.has_more);
    assert_eq!(loader.phase, LoaderPhase::Exhausted);
    assert_eq!(loader.cursor, 0);
    assert!(loader.begin_fetch().is_none());
}

#[tokio::test]
async fn index_failure_fails_the_batch_until_retried() {
    let source = FixtureSource::new();
    let references = vec![source.add_pokemon(1, "bulbasaur")];
    source.add_index(0, 5, &references);
    let index = index_url(BASE, 0, 5);
    source.fail(index.clone());

    let catalog = catalog(&source);
    let mut loader = LoaderState::new(5);
    let request = loader.begin_fetch().expect("idle loader fetches");
    let error = catalog.fetch_batch(request).await.expect_err("index is down");
    assert!(matches!(error, FetchError::Status { status: 503, .. }));

    assert!(loader.fail(request.offset, error.to_string()));
    assert_eq!(loader.phase, LoaderPhase::Exhausted);
    assert!(loader.failure.is_some());
    assert!(loader.begin_fetch().is_none());

    source.heal(&index);
    let retry = loader.begin_retry().expect("failed batch can be retried");
    assert_eq!(retry, BatchRequest { offset: 0, limit: 5 });
    let outcome = catalog.fetch_batch(retry).await.expect("batch loads");
    assert!(loader.complete(outcome));
    assert_eq!(loader.items.len(), 1);
    assert_eq!(source.calls_to(&index), 2);
}

#[tokio::test]
async fn shutdown_aborts_batches() {
    let source = FixtureSource::new();
    source.add_index(0, 5, &[]);

    let catalog = catalog(&source);
    catalog.shutdown();
    let error = catalog
        .fetch_batch(BatchRequest { offset: 0, limit: 5 })
        .await
        .expect_err("shut down");

    assert!(error.is_aborted());
    assert!(catalog.is_shut_down());
}

#[tokio::test(start_paused = true)]
async fn hung_index_fails_the_batch_instead_of_stalling() {
    let source = FixtureSource::new();
    source.hang(index_url(BASE, 0, 5));

    let catalog = catalog(&source);
    let mut state = AppState::new(5);
    let result = reducer(&mut state, Action::Init);
    let request = match result.effects.as_slice() {
        [Effect::FetchBatch(request)] => *request,
        other => panic!("expected one batch request, got {other:?}"),
    };
    assert!(state.loader.is_loading());

    let fetched = catalog.fetch_batch(request).await;
    assert!(matches!(fetched, Err(FetchError::Timeout(_))));

    let action = batch_action(request.offset, fetched);
    assert!(matches!(action, Action::LoaderDidError { offset: 0, .. }));
    assert!(reducer(&mut state, action).changed);
    assert!(!state.loader.is_loading());
    assert_eq!(state.loader.phase, LoaderPhase::Exhausted);
    assert!(state.loader.failure.is_some());
}
