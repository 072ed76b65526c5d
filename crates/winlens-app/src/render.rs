// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::contrast::resolve_text_color;
use crate::{
    EventDescriptor, EventDictionary, EventId, TextColor, VisualBlock, VisualWindow, WindowRow,
};

pub const FALLBACK_BACKGROUND: &str = "#9ca3af";

/// How a dictionary hit is turned into a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StylingStrategy {
    /// Component base colour, label carries the percentile range.
    #[default]
    Percentile,
    /// Intensity-scaled colour, bare id label, details in the tooltip.
    Intensity,
}

impl StylingStrategy {
    pub const ALL: [Self; 2] = [Self::Percentile, Self::Intensity];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentile => "percentile",
            Self::Intensity => "intensity",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "percentile" => Some(Self::Percentile),
            "intensity" => Some(Self::Intensity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowRenderer {
    strategy: StylingStrategy,
}

impl WindowRenderer {
    pub const fn new(strategy: StylingStrategy) -> Self {
        Self { strategy }
    }

    pub const fn strategy(&self) -> StylingStrategy {
        self.strategy
    }

    /// Turns consecutive result rows into windows numbered from `start_index`.
    ///
    /// Pure: the output depends only on the arguments, so rendering the next
    /// page never touches windows produced for earlier ones.
    pub fn render(
        &self,
        rows: &[WindowRow],
        start_index: u64,
        dictionary: &EventDictionary,
    ) -> Vec<VisualWindow> {
        rows.iter()
            .zip(start_index..)
            .map(|(row, index)| VisualWindow {
                index,
                observation: self.render_blocks(&row.observation_events, dictionary),
                prediction: self.render_blocks(&row.prediction_events, dictionary),
            })
            .collect()
    }

    fn render_blocks(&self, events: &[EventId], dictionary: &EventDictionary) -> Vec<VisualBlock> {
        events
            .iter()
            .map(|event_id| self.render_block(event_id, dictionary))
            .collect()
    }

    pub fn render_block(&self, event_id: &EventId, dictionary: &EventDictionary) -> VisualBlock {
        match dictionary.get(event_id) {
            Some(descriptor) => self.decorated_block(event_id, descriptor),
            None => fallback_block(event_id),
        }
    }

    fn decorated_block(&self, event_id: &EventId, descriptor: &EventDescriptor) -> VisualBlock {
        match self.strategy {
            StylingStrategy::Percentile => VisualBlock {
                event_id: event_id.clone(),
                label: format!(
                    "{event_id} | {}-{}",
                    strip_qualifier(&descriptor.percentile_origin),
                    strip_qualifier(&descriptor.percentile_target),
                ),
                background: descriptor.base_color.clone(),
                text: resolve_text_color(&descriptor.base_color),
                tooltip: descriptor.name.clone(),
                decorated: true,
            },
            StylingStrategy::Intensity => VisualBlock {
                event_id: event_id.clone(),
                label: event_id.to_string(),
                background: descriptor.final_color.clone(),
                text: resolve_text_color(&descriptor.final_color),
                tooltip: format!(
                    "{}\npercentile: {}\nevent id: {event_id}",
                    descriptor.name, descriptor.percentile_target
                ),
                decorated: true,
            },
        }
    }
}

fn fallback_block(event_id: &EventId) -> VisualBlock {
    VisualBlock {
        event_id: event_id.clone(),
        label: event_id.to_string(),
        background: FALLBACK_BACKGROUND.to_owned(),
        text: TextColor::Dark,
        tooltip: format!("event {event_id}"),
        decorated: false,
    }
}

/// `Q90` -> `90`. Values without a leading qualifier pass through.
fn strip_qualifier(percentile: &str) -> &str {
    let stripped = percentile.trim_start_matches(|ch: char| ch.is_ascii_alphabetic());
    if stripped.is_empty() {
        percentile
    } else {
        stripped
    }
}
