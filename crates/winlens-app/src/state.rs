// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Query, QueryFormField, QueryFormInput, QueryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Queries,
    Windows,
    Form(QueryFormField),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub focus: FocusPane,
    pub queries: Vec<Query>,
    pub selected: Option<QueryId>,
    pub form: QueryFormInput,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            focus: FocusPane::Queries,
            queries: Vec::new(),
            selected: None,
            form: QueryFormInput::default(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleFocus,
    OpenForm,
    NextFormField,
    CloseForm,
    SelectNext,
    SelectPrev,
    Select(QueryId),
    ReplaceQueries(Vec<Query>),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FocusChanged(FocusPane),
    QuerySelected(Option<QueryId>),
    QueriesReplaced(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleFocus => {
                self.focus = match self.focus {
                    FocusPane::Queries => FocusPane::Windows,
                    FocusPane::Windows | FocusPane::Form(_) => FocusPane::Queries,
                };
                vec![AppEvent::FocusChanged(self.focus)]
            }
            AppCommand::OpenForm => {
                self.form = QueryFormInput::default();
                self.focus = FocusPane::Form(QueryFormField::Src);
                vec![AppEvent::FocusChanged(self.focus)]
            }
            AppCommand::NextFormField => match self.focus {
                FocusPane::Form(field) => {
                    self.focus = FocusPane::Form(field.next());
                    vec![AppEvent::FocusChanged(self.focus)]
                }
                FocusPane::Queries | FocusPane::Windows => Vec::new(),
            },
            AppCommand::CloseForm => {
                self.focus = FocusPane::Queries;
                vec![AppEvent::FocusChanged(self.focus)]
            }
            AppCommand::SelectNext => self.step_selection(1),
            AppCommand::SelectPrev => self.step_selection(-1),
            AppCommand::Select(id) => {
                if self.selected.as_ref() == Some(&id) {
                    return Vec::new();
                }
                self.selected = Some(id);
                vec![AppEvent::QuerySelected(self.selected.clone())]
            }
            AppCommand::ReplaceQueries(queries) => self.replace_queries(queries),
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn selected_query(&self) -> Option<&Query> {
        let selected = self.selected.as_ref()?;
        self.queries.iter().find(|query| &query.id == selected)
    }

    pub fn selected_position(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.queries.iter().position(|query| &query.id == selected)
    }

    fn step_selection(&mut self, delta: isize) -> Vec<AppEvent> {
        if self.queries.is_empty() {
            return Vec::new();
        }
        let len = self.queries.len() as isize;
        let current = self
            .selected_position()
            .map_or(len - 1, |position| position as isize);
        let next = (current + delta).rem_euclid(len) as usize;
        let id = self.queries[next].id.clone();
        self.dispatch(AppCommand::Select(id))
    }

    /// Keeps the current selection if it survived the refresh, otherwise
    /// falls back to the most recent query. A kept selection that just
    /// finished is announced again so its windows get loaded.
    fn replace_queries(&mut self, queries: Vec<Query>) -> Vec<AppEvent> {
        let previous_status = self.selected_query().map(|query| query.status);
        self.queries = queries;
        let mut events = vec![AppEvent::QueriesReplaced(self.queries.len())];

        if let Some(current) = self.selected_query() {
            let finished = current.status.is_terminal()
                && previous_status.is_some_and(|status| !status.is_terminal());
            if finished {
                events.push(AppEvent::QuerySelected(self.selected.clone()));
            }
            return events;
        }
        let fallback = self.queries.last().map(|query| query.id.clone());
        if fallback != self.selected {
            self.selected = fallback;
            events.push(AppEvent::QuerySelected(self.selected.clone()));
        }
        events
    }
}
