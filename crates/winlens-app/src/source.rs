// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{EventDictionary, FetchError, Query, QueryId, WindowPage};

/// Everything the pagination engine needs from the backend.
pub trait DataSource {
    fn list_queries(&self) -> Result<Vec<Query>, FetchError>;
    fn run_query(&self, src: Option<&str>, dst: Option<&str>) -> Result<Query, FetchError>;
    fn fetch_event_dictionary(&self) -> Result<EventDictionary, FetchError>;
    fn fetch_query_windows(
        &self,
        query_id: &QueryId,
        offset: u64,
        limit: u64,
    ) -> Result<WindowPage, FetchError>;
}
