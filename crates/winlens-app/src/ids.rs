// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(QueryId);

/// Key into the event dictionary.
///
/// The backend keys its dictionary by JSON object keys (always strings) while
/// window rows carry plain integers, so numeric text is folded into
/// [`EventId::Number`] on every construction path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawEventId")]
pub enum EventId {
    Number(i64),
    Name(String),
}

impl EventId {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => Self::Number(value),
            Err(_) => Self::Name(trimmed.to_owned()),
        }
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Name(value) => f.write_str(value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEventId {
    Number(i64),
    Name(String),
}

impl From<RawEventId> for EventId {
    fn from(value: RawEventId) -> Self {
        match value {
            RawEventId::Number(value) => Self::Number(value),
            RawEventId::Name(value) => Self::parse(&value),
        }
    }
}
