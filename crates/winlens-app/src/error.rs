// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error as ThisError;

/// Failure of any data-source call.
///
/// Cloneable so one failed dictionary fetch can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FetchError {
    /// Transport failure, or the server answered with a non-success status.
    #[error("{}", network_message(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// A page contradicted what was already loaded: no rows while the server
    /// still reported more, or a total below the rows already loaded.
    #[error(
        "page at offset {offset} is inconsistent with the server total of {total}; refusing to paginate further"
    )]
    PaginationAnomaly { offset: u64, total: u64 },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

fn network_message(status: &Option<u16>, message: &str) -> String {
    match *status {
        Some(status) => format!("server error ({status}): {message}"),
        None => message.to_owned(),
    }
}
