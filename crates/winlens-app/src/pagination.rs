// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::{
    DataSource, EventDictionary, EventDictionaryCache, FetchError, PaginationState, Query,
    QueryId, VisualWindow, WindowPage, WindowRenderer, WindowRow,
};

pub const DEFAULT_PAGE_SIZE: u64 = 500;
pub const MAX_PAGE_SIZE: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPhase {
    Idle,
    Loading,
    Exhausted,
}

/// Generation of a render session. Bumped on every reset so results from a
/// previously selected query can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub token: SessionToken,
    pub query_id: QueryId,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing to do: no query, a fetch already in flight, or exhausted.
    Skipped,
    /// The result belonged to an older session and was discarded.
    Stale,
    Loaded { rows: usize, exhausted: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingPage {
    start_index: u64,
    rows: Vec<WindowRow>,
}

/// Incremental loader for the windows of one selected query.
#[derive(Debug, Clone)]
pub struct QueryDataPaginator {
    renderer: WindowRenderer,
    limit: u64,
    query_id: Option<QueryId>,
    generation: u64,
    phase: PaginationPhase,
    state: PaginationState,
    windows: Vec<VisualWindow>,
    pending: VecDeque<PendingPage>,
    last_error: Option<FetchError>,
}

impl QueryDataPaginator {
    pub fn new(limit: u64, renderer: WindowRenderer) -> Self {
        let state = PaginationState::new(limit.min(MAX_PAGE_SIZE));
        Self {
            renderer,
            limit: state.limit,
            query_id: None,
            generation: 0,
            phase: PaginationPhase::Idle,
            state,
            windows: Vec::new(),
            pending: VecDeque::new(),
            last_error: None,
        }
    }

    /// Starts a fresh session for `query`, discarding everything rendered so far.
    pub fn reset(&mut self, query: &Query) -> SessionToken {
        self.start_session(Some(query.id.clone()))
    }

    /// Drops the current session without selecting another query.
    pub fn clear(&mut self) -> SessionToken {
        self.start_session(None)
    }

    fn start_session(&mut self, query_id: Option<QueryId>) -> SessionToken {
        self.generation = self.generation.saturating_add(1);
        self.query_id = query_id;
        self.phase = PaginationPhase::Idle;
        self.state = PaginationState::new(self.limit);
        self.windows.clear();
        self.pending.clear();
        self.last_error = None;
        self.token()
    }

    /// Claims the next page. Returns `None` when a fetch is already in flight,
    /// the query is exhausted, or no query is selected; such calls are dropped
    /// rather than queued.
    pub fn begin_load(&mut self) -> Option<PageRequest> {
        if self.phase != PaginationPhase::Idle {
            return None;
        }
        let query_id = self.query_id.clone()?;

        self.phase = PaginationPhase::Loading;
        self.state.loading = true;
        let request = PageRequest {
            token: self.token(),
            query_id,
            offset: self.state.offset,
            limit: self.state.limit,
        };
        debug!(
            query = %request.query_id,
            offset = request.offset,
            limit = request.limit,
            "page requested"
        );
        Some(request)
    }

    /// Applies the result of a request issued by [`Self::begin_load`].
    pub fn complete_load(
        &mut self,
        token: SessionToken,
        result: Result<WindowPage, FetchError>,
    ) -> Result<LoadOutcome, FetchError> {
        if token != self.token() || self.phase != PaginationPhase::Loading {
            warn!(
                token = token.get(),
                current = self.generation,
                "discarding page for stale session"
            );
            return Ok(LoadOutcome::Stale);
        }

        self.phase = PaginationPhase::Idle;
        self.state.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                warn!(offset = self.state.offset, %error, "page fetch failed");
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };

        let offset = self.state.offset;
        let total = page.total;
        let mut rows = page.rows;

        // A total below what was already loaded, or an empty page short of
        // the total, leaves offset and total as they were.
        if total < offset || (rows.is_empty() && offset < total) {
            let error = FetchError::PaginationAnomaly { offset, total };
            warn!(%error, "page inconsistent with results loaded so far");
            self.last_error = Some(error.clone());
            return Err(error);
        }
        self.state.total = total;

        let remaining = usize::try_from(total - offset).unwrap_or(usize::MAX);
        if rows.len() > remaining {
            warn!(
                returned = rows.len(),
                remaining, "server returned more rows than its total; truncating"
            );
            rows.truncate(remaining);
        }

        let returned = rows.len();
        self.state.offset = offset.saturating_add(returned as u64);
        if !rows.is_empty() {
            self.pending.push_back(PendingPage {
                start_index: offset,
                rows,
            });
        }

        let exhausted = total == 0 || self.state.offset >= total;
        if exhausted {
            self.phase = PaginationPhase::Exhausted;
        }
        self.last_error = None;
        debug!(
            returned,
            offset = self.state.offset,
            total = self.state.total,
            exhausted,
            "page loaded"
        );
        Ok(LoadOutcome::Loaded {
            rows: returned,
            exhausted,
        })
    }

    /// Renders every page whose rows arrived but were not drawn yet, in order.
    /// Returns the number of windows appended.
    pub fn render_pending(&mut self, dictionary: &EventDictionary) -> usize {
        let before = self.windows.len();
        while let Some(page) = self.pending.pop_front() {
            let rendered = self
                .renderer
                .render(&page.rows, page.start_index, dictionary);
            self.windows.extend(rendered);
        }
        if before != self.windows.len() {
            self.last_error = None;
        }
        self.windows.len() - before
    }

    /// Fetches the dictionary through `cache` if any page is waiting for it.
    pub fn render_with<S>(
        &mut self,
        source: &S,
        cache: &EventDictionaryCache,
    ) -> Result<usize, FetchError>
    where
        S: DataSource + ?Sized,
    {
        if self.pending.is_empty() {
            return Ok(0);
        }
        match cache.get(source) {
            Ok(dictionary) => Ok(self.render_pending(&dictionary)),
            Err(error) => {
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Blocking composition of one full load step: claim, fetch, apply, render.
    pub fn load_next<S>(
        &mut self,
        source: &S,
        cache: &EventDictionaryCache,
    ) -> Result<LoadOutcome, FetchError>
    where
        S: DataSource + ?Sized,
    {
        let Some(request) = self.begin_load() else {
            return Ok(LoadOutcome::Skipped);
        };
        let result = source.fetch_query_windows(&request.query_id, request.offset, request.limit);
        let outcome = self.complete_load(request.token, result)?;
        self.render_with(source, cache)?;
        Ok(outcome)
    }

    /// Records a failure that happened outside `complete_load`, such as a
    /// dictionary fetch performed on another thread.
    pub fn record_error(&mut self, token: SessionToken, error: FetchError) {
        if token == self.token() {
            self.last_error = Some(error);
        }
    }

    pub const fn token(&self) -> SessionToken {
        SessionToken(self.generation)
    }

    pub const fn phase(&self) -> PaginationPhase {
        self.phase
    }

    pub const fn state(&self) -> PaginationState {
        self.state
    }

    pub const fn renderer(&self) -> WindowRenderer {
        self.renderer
    }

    pub fn query_id(&self) -> Option<&QueryId> {
        self.query_id.as_ref()
    }

    pub fn windows(&self) -> &[VisualWindow] {
        &self.windows
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub const fn is_exhausted(&self) -> bool {
        matches!(self.phase, PaginationPhase::Exhausted)
    }

    /// `load more (offset/total)` while more pages exist, `None` once exhausted
    /// or before the first page has told us the total.
    pub fn progress_label(&self) -> Option<String> {
        if self.query_id.is_none() || self.is_exhausted() || self.state.total == 0 {
            return None;
        }
        Some(format!(
            "load more ({}/{})",
            self.state.offset, self.state.total
        ))
    }
}
