//! OpenAI-based embedding client implementation.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Embedder;
use crate::error::{Error, Result};

/// Connection settings for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// Bearer token.
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Optional `dimensions` request override.
    pub dimensions: Option<usize>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a retryable failure (0 disables retries).
    pub max_retries: usize,
}

/// Blocking embeddings client that talks to OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
}

impl OpenAiEmbedder {
    /// Builds a new OpenAI embeddings client.
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(Error::Configuration("missing OpenAI API key".into()));
        }
        if settings.model.trim().is_empty() {
            return Err(Error::Configuration("missing OpenAI model name".into()));
        }
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::Configuration("invalid OpenAI API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| {
                Error::Configuration(format!("failed to build OpenAI HTTP client: {err}"))
            })?;
        let endpoint = format!("{}/embeddings", settings.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: settings.model,
            dimensions: settings.dimensions,
            max_retries: settings.max_retries,
        })
    }

    /// Embeddings endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_once(&self, inputs: &[&str]) -> Attempt {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };
        let resp = match self.client.post(&self.endpoint).json(&request).send() {
            Ok(resp) => resp,
            Err(err) => {
                let retryable = is_retryable_error(&err);
                return Attempt::Failed {
                    error: Error::Provider(format!("OpenAI embeddings request failed: {err}")),
                    retryable,
                };
            }
        };
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Attempt::Failed {
                error: Error::Provider(format!(
                    "OpenAI embeddings request failed ({status}): {body}"
                )),
                retryable: should_retry(status),
            };
        }
        match resp.text() {
            Ok(body) => match parse_response(&body, inputs.len()) {
                Ok(vectors) => Attempt::Done(vectors),
                Err(error) => Attempt::Failed {
                    error,
                    retryable: false,
                },
            },
            Err(err) => Attempt::Failed {
                error: Error::Provider(format!("failed to read OpenAI response body: {err}")),
                retryable: is_retryable_error(&err),
            },
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let mut attempt = 0usize;
        loop {
            match self.send_once(inputs) {
                Attempt::Done(vectors) => return Ok(vectors),
                Attempt::Failed { error, retryable } => {
                    if retryable && attempt < self.max_retries {
                        attempt += 1;
                        let delay = retry_backoff(attempt);
                        warn!(attempt, ?delay, %error, "retrying embedding request");
                        thread::sleep(delay);
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }
}

enum Attempt {
    Done(Vec<Vec<f32>>),
    Failed { error: Error, retryable: bool },
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

fn parse_response(body: &str, expected_len: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|err| Error::Provider(format!("failed to parse OpenAI embedding response: {err}")))?;
    parsed.data.sort_by_key(|entry| entry.index);
    if parsed.data.len() != expected_len {
        return Err(Error::Provider(format!(
            "OpenAI returned {} embeddings for {} inputs",
            parsed.data.len(),
            expected_len
        )));
    }
    Ok(parsed
        .data
        .into_iter()
        .map(|entry| entry.embedding)
        .collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_http::{silent_server, stub_server};
    use std::net::TcpListener;
    use std::sync::atomic::Ordering;

    const EMBEDDING_OK: &str = r#"{"data":[{"index":0,"embedding":[0.1,0.2]}]}"#;

    fn settings(base_url: String) -> OpenAiSettings {
        OpenAiSettings {
            api_key: "sk-test".into(),
            base_url,
            model: "text-embedding-3-small".into(),
            dimensions: None,
            timeout: Duration::from_secs(2),
            max_retries: 0,
        }
    }

    #[test]
    fn parses_out_of_order_entries_by_index() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.3,0.4]},
            {"object":"embedding","index":0,"embedding":[0.1,0.2]}
        ],"model":"text-embedding-3-small"}"#;
        let vectors = parse_response(body, 2).expect("parses");
        assert_eq!(vectors, vec![vec![0.1f32, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn malformed_or_short_responses_are_provider_errors() {
        assert!(matches!(parse_response("<html>", 1), Err(Error::Provider(_))));
        assert!(matches!(
            parse_response(r#"{"data":[]}"#, 1),
            Err(Error::Provider(_))
        ));
    }

    #[test]
    fn request_omits_unset_dimensions() {
        let inputs = ["hello"];
        let request = EmbeddingRequest {
            model: "m",
            input: &inputs,
            dimensions: None,
        };
        assert_eq!(
            serde_json::to_string(&request).expect("serializes"),
            r#"{"model":"m","input":["hello"]}"#
        );
    }

    #[test]
    fn blank_api_key_is_configuration_error() {
        let mut settings = settings("http://127.0.0.1:9".into());
        settings.api_key = "  ".into();
        assert!(matches!(
            OpenAiEmbedder::new(settings),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn unreachable_endpoint_is_provider_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let embedder =
            OpenAiEmbedder::new(settings(format!("http://127.0.0.1:{port}/v1"))).expect("client");
        assert_eq!(
            embedder.endpoint(),
            format!("http://127.0.0.1:{port}/v1/embeddings")
        );
        let err = embedder.embed_batch(&["hello"]).expect_err("nothing listening");
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1000));
        assert_eq!(retry_backoff(9), retry_backoff(5));
    }

    #[test]
    fn retries_rate_limits_and_server_errors_until_success() {
        let (base_url, served) = stub_server(vec![
            ("500 Internal Server Error", r#"{"error":"boom"}"#),
            ("429 Too Many Requests", r#"{"error":"slow down"}"#),
            ("200 OK", EMBEDDING_OK),
        ]);
        let mut settings = settings(format!("{base_url}/v1"));
        settings.max_retries = 2;
        let embedder = OpenAiEmbedder::new(settings).expect("client");
        let vectors = embedder.embed_batch(&["hello"]).expect("third attempt succeeds");
        assert_eq!(vectors, vec![vec![0.1f32, 0.2]]);
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_retries_sends_a_single_request() {
        let (base_url, served) = stub_server(vec![
            ("500 Internal Server Error", r#"{"error":"boom"}"#),
            ("200 OK", EMBEDDING_OK),
        ]);
        let embedder = OpenAiEmbedder::new(settings(format!("{base_url}/v1"))).expect("client");
        let err = embedder.embed_batch(&["hello"]).expect_err("no retry");
        assert!(matches!(&err, Error::Provider(message) if message.contains("500")));
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let (base_url, served) = stub_server(vec![
            ("400 Bad Request", r#"{"error":"bad input"}"#),
            ("200 OK", EMBEDDING_OK),
        ]);
        let mut settings = settings(format!("{base_url}/v1"));
        settings.max_retries = 3;
        let embedder = OpenAiEmbedder::new(settings).expect("client");
        assert!(matches!(
            embedder.embed_batch(&["hello"]),
            Err(Error::Provider(_))
        ));
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn silent_server_times_out_as_provider_error() {
        let mut settings = settings(format!("{}/v1", silent_server()));
        settings.timeout = Duration::from_millis(200);
        let embedder = OpenAiEmbedder::new(settings).expect("client");
        assert!(matches!(
            embedder.embed_batch(&["hello"]),
            Err(Error::Provider(_))
        ));
    }
}
