// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;
use winlens_app::{
    DataSource, EventDictionary, EventDictionaryCache, FetchError, PageRequest, Query,
    SessionToken, WindowPage,
};
use winlens_tui::{AppRuntime, InternalEvent};

/// Runs backend calls for the terminal UI on worker threads, sharing one
/// dictionary cache across every load.
pub struct SourceRuntime<S> {
    source: Arc<S>,
    cache: Arc<EventDictionaryCache>,
}

impl<S> SourceRuntime<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(EventDictionaryCache::new()),
        }
    }
}

impl<S> AppRuntime for SourceRuntime<S>
where
    S: DataSource + Send + Sync + 'static,
{
    fn list_queries(&mut self) -> Result<Vec<Query>> {
        self.source.list_queries().context("list queries")
    }

    fn run_query(&mut self, src: Option<&str>, dst: Option<&str>) -> Result<Query> {
        self.source.run_query(src, dst).context("run query")
    }

    fn load_page(&mut self, request: &PageRequest) -> Result<WindowPage, FetchError> {
        self.source
            .fetch_query_windows(&request.query_id, request.offset, request.limit)
    }

    fn load_dictionary(&mut self) -> Result<Arc<EventDictionary>, FetchError> {
        self.cache.get(self.source.as_ref())
    }

    fn spawn_page_load(&mut self, request: PageRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        thread::Builder::new()
            .name("winlens-page".to_owned())
            .spawn(move || {
                let page =
                    source.fetch_query_windows(&request.query_id, request.offset, request.limit);
                let dictionary = page.is_ok().then(|| cache.get(source.as_ref()));
                let event = InternalEvent::PageLoaded {
                    token: request.token,
                    page,
                    dictionary,
                };
                if tx.send(event).is_err() {
                    debug!(offset = request.offset, "page result dropped after shutdown");
                }
            })
            .map_err(|error| anyhow!("spawn page loader: {error}"))?;
        Ok(())
    }

    fn spawn_dictionary_load(
        &mut self,
        token: SessionToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        thread::Builder::new()
            .name("winlens-dictionary".to_owned())
            .spawn(move || {
                let result = cache.get(source.as_ref());
                if tx
                    .send(InternalEvent::DictionaryLoaded { token, result })
                    .is_err()
                {
                    debug!("dictionary result dropped after shutdown");
                }
            })
            .map_err(|error| anyhow!("spawn dictionary loader: {error}"))?;
        Ok(())
    }

    fn spawn_run_query(
        &mut self,
        src: Option<String>,
        dst: Option<String>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let source = Arc::clone(&self.source);
        thread::Builder::new()
            .name("winlens-query".to_owned())
            .spawn(move || {
                let result = source
                    .run_query(src.as_deref(), dst.as_deref())
                    .map_err(|error| error.to_string());
                if tx.send(InternalEvent::QueryRan(result)).is_err() {
                    debug!("query result dropped after shutdown");
                }
            })
            .map_err(|error| anyhow!("spawn query runner: {error}"))?;
        Ok(())
    }
}
