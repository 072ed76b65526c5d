// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use winlens_app::{
    DataSource, EventDescriptor, EventDictionary, EventId, FetchError, Query, QueryId,
    QueryStatus, WindowPage, WindowRow,
};

pub const PERCENTILES: [&str; 5] = ["Q10", "Q25", "Q50", "Q75", "Q90"];

const COMPONENTS: [(&str, &str); 4] = [
    ("HR", "#e63946"),
    ("SPO2", "#ffd166"),
    ("RESP", "#118ab2"),
    ("TEMP", "#06d6a0"),
];

/// Builds a descriptor from an event name of the form `COMPONENT_Qnn` or
/// `COMPONENT_Qnn_to_Qmm`, scaling the component colour by the target
/// percentile the way the backend does.
pub fn descriptor(id: i64, name: &str, base_color: &str) -> EventDescriptor {
    let (component, percentiles) = name.split_once("_Q").unwrap_or((name, ""));
    let (origin, target) = match percentiles.split_once("_to_Q") {
        Some((origin, target)) => (format!("Q{origin}"), format!("Q{target}")),
        None => (format!("Q{percentiles}"), format!("Q{percentiles}")),
    };
    let percentile_index = PERCENTILES
        .iter()
        .position(|candidate| *candidate == target)
        .map(|index| index as u32);
    let intensity =
        percentile_index.map(|index| f64::from(index + 1) / PERCENTILES.len() as f64);

    EventDescriptor {
        event_id: EventId::Number(id),
        name: name.to_owned(),
        component: component.to_owned(),
        percentile_origin: origin,
        percentile_target: target,
        percentile_index,
        intensity,
        base_color: base_color.to_owned(),
        final_color: scaled_rgb(base_color, intensity.unwrap_or(1.0)),
    }
}

fn scaled_rgb(hex: &str, intensity: f64) -> String {
    let channel = |start: usize| {
        let raw = hex
            .get(start..start + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0x99);
        (f64::from(raw) * intensity) as u8
    };
    format!("rgb({},{},{})", channel(1), channel(3), channel(5))
}

/// Twenty events: every component crossed with every percentile, ids 1..=20.
pub fn sample_dictionary() -> EventDictionary {
    let mut dictionary = BTreeMap::new();
    let mut id = 0;
    for (component, color) in COMPONENTS {
        for percentile in PERCENTILES {
            id += 1;
            let name = format!("{component}_{percentile}");
            dictionary.insert(EventId::Number(id), descriptor(id, &name, color));
        }
    }
    dictionary
}

pub fn sample_query(id: &str) -> Query {
    Query {
        id: QueryId::new(id),
        src_raw: Some("hr q90".to_owned()),
        dst_raw: Some("spo2 q10".to_owned()),
        src_filter: Some("HR_Q90".to_owned()),
        dst_filter: Some("SPO2_Q10".to_owned()),
        status: QueryStatus::Done,
        rows: 0,
        error: None,
        created_at: Some(OffsetDateTime::UNIX_EPOCH),
    }
}

/// Deterministic rows whose event ids cycle through the sample dictionary,
/// with every seventh id deliberately missing from it.
pub fn sample_rows(count: usize) -> Vec<WindowRow> {
    (0..count)
        .map(|index| {
            let id = |offset: usize| {
                let raw = (index + offset) % 21 + 1;
                if raw % 7 == 0 {
                    EventId::Number(900 + raw as i64)
                } else {
                    EventId::Number(raw as i64)
                }
            };
            WindowRow {
                observation_events: vec![id(0), id(1), id(2)],
                prediction_events: vec![id(3)],
            }
        })
        .collect()
}

/// In-memory [`DataSource`] with scripted failures and call counters.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queries: Mutex<Vec<Query>>,
    dictionary: Mutex<EventDictionary>,
    windows: Mutex<BTreeMap<QueryId, Vec<WindowRow>>>,
    dictionary_failures: Mutex<VecDeque<FetchError>>,
    page_overrides: Mutex<VecDeque<Result<WindowPage, FetchError>>>,
    page_requests: Mutex<Vec<(QueryId, u64, u64)>>,
    dictionary_delay: Mutex<Option<Duration>>,
    dictionary_fetches: AtomicUsize,
    window_fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dictionary(self, dictionary: EventDictionary) -> Self {
        *lock(&self.dictionary) = dictionary;
        self
    }

    pub fn with_query(self, query: Query, rows: Vec<WindowRow>) -> Self {
        lock(&self.windows).insert(query.id.clone(), rows);
        lock(&self.queries).push(query);
        self
    }

    /// Makes each dictionary fetch sleep first, to widen concurrency windows.
    pub fn with_dictionary_delay(self, delay: Duration) -> Self {
        *lock(&self.dictionary_delay) = Some(delay);
        self
    }

    pub fn fail_dictionary(&self, error: FetchError) {
        lock(&self.dictionary_failures).push_back(error);
    }

    /// Moves a listed query to `status`, as a backend finishing it would.
    pub fn set_status(&self, query_id: &QueryId, status: QueryStatus) {
        if let Some(query) = lock(&self.queries)
            .iter_mut()
            .find(|query| &query.id == query_id)
        {
            query.status = status;
        }
    }

    /// Replaces the next page response with `result`, whatever was requested.
    pub fn script_page(&self, result: Result<WindowPage, FetchError>) {
        lock(&self.page_overrides).push_back(result);
    }

    pub fn dictionary_fetches(&self) -> usize {
        self.dictionary_fetches.load(Ordering::SeqCst)
    }

    pub fn window_fetches(&self) -> usize {
        self.window_fetches.load(Ordering::SeqCst)
    }

    pub fn page_requests(&self) -> Vec<(QueryId, u64, u64)> {
        lock(&self.page_requests).clone()
    }
}

impl DataSource for ScriptedSource {
    fn list_queries(&self) -> Result<Vec<Query>, FetchError> {
        Ok(lock(&self.queries).clone())
    }

    fn run_query(&self, src: Option<&str>, dst: Option<&str>) -> Result<Query, FetchError> {
        if src.is_none() && dst.is_none() {
            return Err(FetchError::status(400, "src or dst is required"));
        }
        let mut queries = lock(&self.queries);
        let query = Query {
            id: QueryId::new(format!("q{}", queries.len() + 1)),
            src_raw: src.map(str::to_owned),
            dst_raw: dst.map(str::to_owned),
            src_filter: src.map(str::to_owned),
            dst_filter: dst.map(str::to_owned),
            status: QueryStatus::Done,
            rows: 0,
            error: None,
            created_at: None,
        };
        queries.push(query.clone());
        lock(&self.windows).insert(query.id.clone(), Vec::new());
        Ok(query)
    }

    fn fetch_event_dictionary(&self) -> Result<EventDictionary, FetchError> {
        self.dictionary_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.dictionary_delay);
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        if let Some(error) = lock(&self.dictionary_failures).pop_front() {
            return Err(error);
        }
        Ok(lock(&self.dictionary).clone())
    }

    fn fetch_query_windows(
        &self,
        query_id: &QueryId,
        offset: u64,
        limit: u64,
    ) -> Result<WindowPage, FetchError> {
        self.window_fetches.fetch_add(1, Ordering::SeqCst);
        lock(&self.page_requests).push((query_id.clone(), offset, limit));
        if let Some(result) = lock(&self.page_overrides).pop_front() {
            return result;
        }

        let windows = lock(&self.windows);
        let rows = windows
            .get(query_id)
            .ok_or_else(|| FetchError::status(404, "query not found"))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(rows.len());
        let end = start
            .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
            .min(rows.len());
        Ok(WindowPage {
            rows: rows[start..end].to_vec(),
            total: rows.len() as u64,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
