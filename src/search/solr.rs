//! Blocking Solr client for the `/select` handler.

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{SearchBackend, SearchHit, SearchRequest, ID_FIELD, SCORE_FIELD};
use crate::error::{Error, Result};

/// Solr collection reachable over HTTP.
#[derive(Clone)]
pub struct SolrBackend {
    client: Client,
    select_url: String,
}

impl SolrBackend {
    /// Builds a client for `{base_url}/{collection}/select`.
    pub fn new(base_url: &str, collection: &str, timeout: Duration) -> Result<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Configuration(format!(
                "Solr base URL must be an http(s) URL, got {base_url:?}"
            )));
        }
        let collection = collection.trim().trim_matches('/');
        if collection.is_empty() {
            return Err(Error::Configuration("Solr collection name is required".into()));
        }
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            Error::Configuration(format!("failed to build Solr HTTP client: {err}"))
        })?;
        Ok(Self {
            client,
            select_url: format!("{}/{}/select", base_url.trim_end_matches('/'), collection),
        })
    }

    /// Full URL of the select handler.
    pub fn select_url(&self) -> &str {
        &self.select_url
    }
}

impl SearchBackend for SolrBackend {
    fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let rows = request.rows().to_string();
        let fields = request.fields().join(",");
        // Vector literals blow past URL length limits, so the query travels
        // as a form body.
        let params = [
            ("q", request.query()),
            ("rows", rows.as_str()),
            ("fl", fields.as_str()),
            ("wt", "json"),
        ];
        debug!(url = %self.select_url, rows = request.rows(), "sending Solr query");
        let resp = self
            .client
            .post(&self.select_url)
            .form(&params)
            .send()
            .map_err(|err| Error::Backend(format!("failed to call Solr at {}: {err}", self.select_url)))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| Error::Backend(format!("failed to read Solr response: {err}")))?;
        if !status.is_success() {
            return Err(Error::Backend(format!(
                "Solr returned {status}: {}",
                failure_detail(body)
            )));
        }
        parse_select_response(&body)
    }
}

/// Parses a `wt=json` select response into hits, keeping document order.
pub fn parse_select_response(body: &str) -> Result<Vec<SearchHit>> {
    let parsed: SelectResponse = serde_json::from_str(body)
        .map_err(|err| Error::Backend(format!("failed to parse Solr response: {err}")))?;
    if let Some(error) = parsed.error {
        return Err(Error::Backend(error.describe()));
    }
    let response = parsed
        .response
        .ok_or_else(|| Error::Backend("Solr response missing `response` section".into()))?;
    response
        .docs
        .into_iter()
        .enumerate()
        .map(|(position, doc)| into_hit(position, doc))
        .collect()
}

fn into_hit(position: usize, mut doc: IndexMap<String, Value>) -> Result<SearchHit> {
    let id = match doc.shift_remove(ID_FIELD) {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        Some(other) => {
            return Err(Error::Backend(format!(
                "document {position} has a non-scalar id: {other}"
            )))
        }
        None => {
            return Err(Error::Backend(format!(
                "document {position} is missing the `{ID_FIELD}` field"
            )))
        }
    };
    let score = doc.shift_remove(SCORE_FIELD).and_then(|value| value.as_f64());
    Ok(SearchHit {
        id,
        score,
        fields: doc,
    })
}

fn failure_detail(body: String) -> String {
    if body.trim().is_empty() {
        return "<empty body>".to_string();
    }
    solr_error_message(&body).unwrap_or(body)
}

fn solr_error_message(body: &str) -> Option<String> {
    let parsed: SelectResponse = serde_json::from_str(body).ok()?;
    parsed.error.map(|error| error.describe())
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(default)]
    response: Option<SelectDocs>,
    #[serde(default)]
    error: Option<SolrError>,
}

#[derive(Debug, Deserialize)]
struct SelectDocs {
    #[serde(default)]
    docs: Vec<IndexMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct SolrError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl SolrError {
    fn describe(&self) -> String {
        let msg = self.msg.as_deref().unwrap_or("unknown Solr error");
        match self.code {
            Some(code) => format!("{msg} (code {code})"),
            None => msg.to_string(),
        }
    }
}
