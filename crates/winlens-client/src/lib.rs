// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, warn};
use url::Url;
use winlens_app::{
    DataSource, EventDescriptor, EventDictionary, EventId, FetchError, Query, QueryId,
    QueryStatus, WindowPage, WindowRow,
};

/// Blocking HTTP binding of [`DataSource`] for the query backend.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("parse server.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if base_url.cannot_be_a_base() {
            bail!("server.base_url {trimmed:?} cannot carry a path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Confirms the backend answers and speaks the expected protocol.
    pub fn ping(&self) -> Result<()> {
        let queries = self
            .list_queries()
            .with_context(|| format!("check backend at {}", self.base_url()))?;
        debug!(queries = queries.len(), "backend reachable");
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`, so the path is always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn fetch<T>(&self, request: RequestBuilder, what: &str) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url(), &error))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| FetchError::network(format!("read {what} response: {error}")))?;
        if !status.is_success() {
            let error = clean_error_response(status, &body);
            warn!(what, %error, "request rejected");
            return Err(error);
        }

        serde_json::from_str(&body)
            .map_err(|error| FetchError::parse(format!("decode {what}: {error}")))
    }
}

impl DataSource for Client {
    fn list_queries(&self) -> Result<Vec<Query>, FetchError> {
        let url = self.endpoint(&["queries"]);
        debug!(%url, "listing queries");
        let records: Vec<QueryRecord> = self.fetch(self.http.get(url), "query list")?;

        let mut queries: Vec<Query> = records.into_iter().map(QueryRecord::into_query).collect();
        queries.sort_by_key(|query| query.created_at);
        Ok(queries)
    }

    fn run_query(&self, src: Option<&str>, dst: Option<&str>) -> Result<Query, FetchError> {
        let url = self.endpoint(&["query"]);
        debug!(%url, ?src, ?dst, "running query");
        let response: RunQueryResponse = self.fetch(
            self.http.post(url).json(&RunQueryRequest { src, dst }),
            "query result",
        )?;
        debug!(
            query = %response.query_id,
            rows = response.rows,
            cached = response.cached,
            "query finished"
        );

        Ok(Query {
            id: QueryId::new(response.query_id),
            src_raw: src.map(str::to_owned),
            dst_raw: dst.map(str::to_owned),
            src_filter: None,
            dst_filter: None,
            status: QueryStatus::Done,
            rows: response.rows,
            error: None,
            created_at: Some(OffsetDateTime::now_utc()),
        })
    }

    fn fetch_event_dictionary(&self) -> Result<EventDictionary, FetchError> {
        let url = self.endpoint(&["events"]);
        debug!(%url, "fetching event dictionary");
        let records: BTreeMap<String, EventRecord> =
            self.fetch(self.http.get(url), "event dictionary")?;

        Ok(records
            .into_iter()
            .map(|(key, record)| {
                let id = EventId::parse(&key);
                (id.clone(), record.into_descriptor(id))
            })
            .collect())
    }

    fn fetch_query_windows(
        &self,
        query_id: &QueryId,
        offset: u64,
        limit: u64,
    ) -> Result<WindowPage, FetchError> {
        let mut url = self.endpoint(&["query", query_id.as_str(), "data"]);
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());
        debug!(%url, "fetching windows");

        let page: WindowPageResponse = self.fetch(self.http.get(url), "window page")?;
        Ok(WindowPage {
            rows: page.rows,
            total: page.total,
        })
    }
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::network(format!(
            "{base_url} did not answer in time -- raise server.timeout or check the backend ({error})"
        ));
    }
    FetchError::network(format!(
        "cannot reach {base_url} -- start the backend or set server.base_url ({error})"
    ))
}

fn clean_error_response(status: StatusCode, body: &str) -> FetchError {
    let code = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<DetailEnvelope>(body)
        && let Some(detail) = parsed.detail.as_ref().and_then(detail_message)
    {
        return FetchError::status(code, detail);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return FetchError::status(code, body);
    }

    FetchError::status(code, status.canonical_reason().unwrap_or("request failed"))
}

/// Flattens a `detail` payload: either a plain message or a list of
/// validation errors carrying `msg`.
fn detail_message(detail: &serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(message) if !message.is_empty() => Some(message.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(raw, naive)
        .map(PrimitiveDateTime::assume_utc)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()
}

#[derive(Debug, Serialize)]
struct RunQueryRequest<'a> {
    src: Option<&'a str>,
    dst: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    query_id: String,
    #[serde(default)]
    rows: u64,
    #[serde(default)]
    cached: bool,
}

#[derive(Debug, Deserialize)]
struct QueryRecord {
    query_id: String,
    #[serde(default)]
    src_raw: Option<String>,
    #[serde(default)]
    dst_raw: Option<String>,
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    dst: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    rows: u64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl QueryRecord {
    fn into_query(self) -> Query {
        let status = QueryStatus::parse(&self.status).unwrap_or_else(|| {
            warn!(query = %self.query_id, status = %self.status, "unknown query status");
            QueryStatus::Pending
        });
        Query {
            id: QueryId::new(self.query_id),
            src_raw: self.src_raw,
            dst_raw: self.dst_raw,
            src_filter: self.src,
            dst_filter: self.dst,
            status,
            rows: self.rows,
            error: self.error,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventRecord {
    event_name: String,
    component: String,
    percentile_origin: String,
    percentile_target: String,
    percentile_index: Option<u32>,
    intensity: Option<f64>,
    base_color: String,
    final_color: String,
}

impl EventRecord {
    fn into_descriptor(self, event_id: EventId) -> EventDescriptor {
        EventDescriptor {
            event_id,
            name: self.event_name,
            component: self.component,
            percentile_origin: self.percentile_origin,
            percentile_target: self.percentile_target,
            percentile_index: self.percentile_index,
            intensity: self.intensity,
            base_color: self.base_color,
            final_color: self.final_color,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WindowPageResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    rows: Vec<WindowRow>,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    detail: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response, parse_timestamp};
    use reqwest::StatusCode;
    use std::time::Duration;
    use time::macros::datetime;
    use winlens_app::FetchError;

    #[test]
    fn rejects_unusable_base_urls() {
        for base in ["", "   ", "ftp://example.com", "not a url"] {
            assert!(
                Client::new(base, Duration::from_secs(1)).is_err(),
                "{base:?} should be rejected"
            );
        }
    }

    #[test]
    fn endpoints_keep_base_path_prefix() -> anyhow::Result<()> {
        let client = Client::new("http://localhost:8000/api/", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.endpoint(&["query", "a b", "data"]).as_str(),
            "http://localhost:8000/api/query/a%20b/data"
        );

        let bare = Client::new("http://localhost:8000", Duration::from_secs(1))?;
        assert_eq!(
            bare.endpoint(&["events"]).as_str(),
            "http://localhost:8000/events"
        );
        Ok(())
    }

    #[test]
    fn error_bodies_are_cleaned() {
        assert_eq!(
            clean_error_response(StatusCode::NOT_FOUND, r#"{"detail":"query not found"}"#),
            FetchError::status(404, "query not found")
        );
        assert_eq!(
            clean_error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["query","limit"],"msg":"too large"},{"msg":"bad offset"}]}"#,
            ),
            FetchError::status(422, "too large; bad offset")
        );
        assert_eq!(
            clean_error_response(StatusCode::BAD_GATEWAY, "upstream down"),
            FetchError::status(502, "upstream down")
        );
        assert_eq!(
            clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"oops":true}"#),
            FetchError::status(500, "Internal Server Error")
        );
    }

    #[test]
    fn timestamps_accept_naive_and_offset_forms() {
        assert_eq!(
            parse_timestamp("2026-03-01T10:15:30.123456"),
            Some(datetime!(2026-03-01 10:15:30.123456 UTC))
        );
        assert_eq!(
            parse_timestamp("2026-03-01T10:15:30+02:00"),
            Some(datetime!(2026-03-01 08:15:30 UTC))
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
