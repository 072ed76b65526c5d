// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::thread;
use std::time::Duration;
use winlens_app::{
    EventDictionaryCache, EventId, FALLBACK_BACKGROUND, FetchError, LoadOutcome, PaginationPhase,
    QueryDataPaginator, QueryId, StylingStrategy, TextColor, WindowPage, WindowRenderer,
};
use winlens_testkit::{ScriptedSource, sample_dictionary, sample_query, sample_rows};

fn source_with_rows(rows: usize) -> ScriptedSource {
    ScriptedSource::new()
        .with_dictionary(sample_dictionary())
        .with_query(sample_query("q1"), sample_rows(rows))
}

#[test]
fn loads_every_page_then_stops() -> Result<()> {
    let source = source_with_rows(1200);
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(500, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));

    let mut offsets = Vec::new();
    for _ in 0..3 {
        paginator.load_next(&source, &cache)?;
        offsets.push(paginator.state().offset);
    }
    assert_eq!(offsets, vec![500, 1000, 1200]);
    assert_eq!(paginator.phase(), PaginationPhase::Exhausted);
    assert_eq!(paginator.windows().len(), 1200);

    assert_eq!(paginator.load_next(&source, &cache)?, LoadOutcome::Skipped);
    assert_eq!(source.window_fetches(), 3);
    assert_eq!(source.dictionary_fetches(), 1);
    assert_eq!(
        source.page_requests(),
        vec![
            (QueryId::new("q1"), 0, 500),
            (QueryId::new("q1"), 500, 500),
            (QueryId::new("q1"), 1000, 500),
        ]
    );
    Ok(())
}

#[test]
fn offsets_grow_monotonically_and_finish_in_ceiling_calls() -> Result<()> {
    for (total, limit) in [(0_usize, 7_u64), (1, 7), (7, 7), (8, 7), (50, 7), (49, 1)] {
        let source = source_with_rows(total);
        let cache = EventDictionaryCache::new();
        let mut paginator = QueryDataPaginator::new(limit, WindowRenderer::default());
        paginator.reset(&sample_query("q1"));

        let mut calls = 0;
        let mut previous = 0;
        while !paginator.is_exhausted() {
            paginator.load_next(&source, &cache)?;
            calls += 1;
            let offset = paginator.state().offset;
            assert!(offset >= previous, "offset went backwards");
            assert!(offset <= paginator.state().total);
            previous = offset;
        }

        let expected = (total as u64).div_ceil(limit).max(1);
        assert_eq!(calls, expected, "total={total} limit={limit}");
        assert_eq!(paginator.windows().len(), total);
    }
    Ok(())
}

#[test]
fn windows_are_indexed_continuously_across_pages() -> Result<()> {
    let source = source_with_rows(25);
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(10, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));
    while !paginator.is_exhausted() {
        paginator.load_next(&source, &cache)?;
    }

    let indices: Vec<u64> = paginator.windows().iter().map(|w| w.index).collect();
    assert_eq!(indices, (0..25).collect::<Vec<_>>());
    assert_eq!(paginator.windows()[24].title(), "window 25");
    Ok(())
}

#[test]
fn concurrent_trigger_issues_a_single_fetch() -> Result<()> {
    let source = source_with_rows(30);
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(10, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));

    let request = paginator.begin_load().expect("first trigger claims the page");
    assert_eq!(paginator.load_next(&source, &cache)?, LoadOutcome::Skipped);
    assert_eq!(source.window_fetches(), 0);

    let result = winlens_app::DataSource::fetch_query_windows(
        &source,
        &request.query_id,
        request.offset,
        request.limit,
    );
    paginator.complete_load(request.token, result)?;
    paginator.render_with(&source, &cache)?;
    assert_eq!(source.window_fetches(), 1);
    assert_eq!(paginator.windows().len(), 10);
    Ok(())
}

#[test]
fn dictionary_failure_keeps_rows_until_next_render() -> Result<()> {
    let source = source_with_rows(40);
    source.fail_dictionary(FetchError::status(503, "warming up"));
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(10, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));

    let error = paginator
        .load_next(&source, &cache)
        .expect_err("dictionary failure should surface");
    assert_eq!(error, FetchError::status(503, "warming up"));
    assert!(paginator.windows().is_empty());
    assert!(paginator.has_pending());
    assert_eq!(paginator.state().offset, 10);
    assert!(!cache.is_populated());

    assert_eq!(paginator.render_with(&source, &cache)?, 10);
    assert!(!paginator.has_pending());
    assert!(paginator.last_error().is_none());

    paginator.load_next(&source, &cache)?;
    assert_eq!(paginator.windows().len(), 20);
    assert_eq!(source.dictionary_fetches(), 2);
    Ok(())
}

#[test]
fn unknown_event_ids_render_with_fallback() -> Result<()> {
    let source = source_with_rows(10);
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(10, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));
    paginator.load_next(&source, &cache)?;

    let missing = paginator
        .windows()
        .iter()
        .flat_map(|window| window.observation.iter().chain(&window.prediction))
        .find(|block| block.event_id == EventId::Number(907))
        .expect("sample rows include id 907");
    assert_eq!(missing.background, FALLBACK_BACKGROUND);
    assert_eq!(missing.text, TextColor::Dark);
    assert_eq!(missing.label, "907");
    assert!(!missing.decorated);
    Ok(())
}

#[test]
fn intensity_strategy_uses_final_color() -> Result<()> {
    let source = source_with_rows(1);
    let cache = EventDictionaryCache::new();
    let mut paginator =
        QueryDataPaginator::new(10, WindowRenderer::new(StylingStrategy::Intensity));
    paginator.reset(&sample_query("q1"));
    paginator.load_next(&source, &cache)?;

    let dictionary = sample_dictionary();
    let block = &paginator.windows()[0].observation[0];
    let descriptor = &dictionary[&block.event_id];
    assert_eq!(block.background, descriptor.final_color);
    assert!(block.decorated);
    Ok(())
}

#[test]
fn anomaly_keeps_session_idle_for_retry() -> Result<()> {
    let source = source_with_rows(30);
    let cache = EventDictionaryCache::new();
    let mut paginator = QueryDataPaginator::new(10, WindowRenderer::default());
    paginator.reset(&sample_query("q1"));
    paginator.load_next(&source, &cache)?;

    source.script_page(Ok(WindowPage {
        rows: Vec::new(),
        total: 30,
    }));
    let error = paginator
        .load_next(&source, &cache)
        .expect_err("empty page before total is an anomaly");
    assert_eq!(
        error,
        FetchError::PaginationAnomaly {
            offset: 10,
            total: 30
        }
    );
    assert_eq!(paginator.phase(), PaginationPhase::Idle);

    paginator.load_next(&source, &cache)?;
    assert_eq!(paginator.state().offset, 20);
    Ok(())
}

#[test]
fn dictionary_is_fetched_once_across_threads() -> Result<()> {
    let source = ScriptedSource::new()
        .with_dictionary(sample_dictionary())
        .with_dictionary_delay(Duration::from_millis(50));
    let cache = EventDictionaryCache::new();
    let (source_ref, cache_ref) = (&source, &cache);

    let sizes = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || cache_ref.get(source_ref).map(|dictionary| dictionary.len()))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("cache thread panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    assert_eq!(sizes, vec![20; 4]);
    assert_eq!(source.dictionary_fetches(), 1);
    Ok(())
}

#[test]
fn waiters_share_a_failed_fetch_then_retry() {
    let source = ScriptedSource::new()
        .with_dictionary(sample_dictionary())
        .with_dictionary_delay(Duration::from_millis(50));
    source.fail_dictionary(FetchError::network("connection refused"));
    let cache = EventDictionaryCache::new();
    let (source_ref, cache_ref) = (&source, &cache);

    let results = thread::scope(|scope| {
        let handles: Vec<_> = (0..3)
            .map(|_| {
                scope.spawn(move || cache_ref.get(source_ref).map(|dictionary| dictionary.len()))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("cache thread panicked"))
            .collect::<Vec<_>>()
    });

    // Only the first fetch is scripted to fail; every error must come from it.
    let failures = results.iter().filter(|result| result.is_err()).count();
    assert!(failures >= 1);
    assert!(results.iter().flatten().all(|len| *len == 20));
    let successes = usize::from(failures < results.len());
    assert_eq!(source.dictionary_fetches(), 1 + successes);

    let dictionary = cache.get(&source).expect("retry after failure");
    assert_eq!(dictionary.len(), 20);
    assert_eq!(source.dictionary_fetches(), 2);
    assert_eq!(cache.get(&source).map(|dictionary| dictionary.len()), Ok(20));
    assert_eq!(source.dictionary_fetches(), 2);
}
