// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl QueryStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub id: QueryId,
    pub src_raw: Option<String>,
    pub dst_raw: Option<String>,
    pub src_filter: Option<String>,
    pub dst_filter: Option<String>,
    pub status: QueryStatus,
    pub rows: u64,
    pub error: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

impl Query {
    /// One-line summary used by query lists, preferring what the user typed
    /// over the canonical filter.
    pub fn describe(&self) -> String {
        let src = self
            .src_raw
            .as_deref()
            .or(self.src_filter.as_deref())
            .unwrap_or("-");
        let dst = self
            .dst_raw
            .as_deref()
            .or(self.dst_filter.as_deref())
            .unwrap_or("-");
        format!("src={src} | dst={dst}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    pub event_id: EventId,
    pub name: String,
    pub component: String,
    pub percentile_origin: String,
    pub percentile_target: String,
    pub percentile_index: Option<u32>,
    pub intensity: Option<f64>,
    pub base_color: String,
    pub final_color: String,
}

pub type EventDictionary = BTreeMap<EventId, EventDescriptor>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRow {
    #[serde(default, alias = "obs_events", deserialize_with = "null_as_empty")]
    pub observation_events: Vec<EventId>,
    #[serde(default, alias = "pred_events", deserialize_with = "null_as_empty")]
    pub prediction_events: Vec<EventId>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<EventId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<EventId>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowPage {
    pub rows: Vec<WindowRow>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
    pub loading: bool,
}

impl PaginationState {
    pub const fn new(limit: u64) -> Self {
        Self {
            offset: 0,
            limit: if limit == 0 { 1 } else { limit },
            total: 0,
            loading: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Dark,
    Light,
}

impl TextColor {
    pub const fn as_hex(self) -> &'static str {
        match self {
            Self::Dark => "#000000",
            Self::Light => "#ffffff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualBlock {
    pub event_id: EventId,
    pub label: String,
    /// CSS-style colour: `#rrggbb` or `rgb(r,g,b)`, as the backend sends it.
    pub background: String,
    pub text: TextColor,
    pub tooltip: String,
    /// False when the id had no dictionary entry and fallback styling applied.
    pub decorated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualWindow {
    pub index: u64,
    pub observation: Vec<VisualBlock>,
    pub prediction: Vec<VisualBlock>,
}

impl VisualWindow {
    pub fn title(&self) -> String {
        format!("window {}", self.index + 1)
    }
}
