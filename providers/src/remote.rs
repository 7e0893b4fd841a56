//! Hosted chat-completion client.
//!
//! One authenticated request per call; no retries, no persisted state -
//! the credential travels with every request. The streaming variant decodes
//! server-sent events incrementally and skips unparseable chunks rather
//! than failing the whole stream.

use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::mpsc;

use sidekick_types::{ApiCredential, RemoteModel};

use crate::{http_client, read_capped_error_body};

/// Canonical hosted completion API base.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Growth cap for the SSE reassembly buffer.
const MAX_SSE_BUFFER_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API credential not configured")]
    MissingCredential,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider error {status}: {message}")]
    Provider { status: StatusCode, message: String },
    #[error("response missing completion content")]
    MalformedResponse,
}

/// Fragment of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Stateless client for the hosted completion endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    model: RemoteModel,
    credential: Option<ApiCredential>,
}

impl RemoteClient {
    #[must_use]
    pub fn new(model: RemoteModel, credential: Option<ApiCredential>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            credential,
        }
    }

    /// Point the client at a different endpoint (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    #[must_use]
    pub fn model(&self) -> &RemoteModel {
        &self.model
    }

    fn request_body(&self, prompt: &str, options: &CompletionOptions, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model.as_str(),
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }

    async fn send(
        &self,
        prompt: &str,
        options: &CompletionOptions,
        stream: bool,
    ) -> Result<reqwest::Response, RemoteError> {
        let Some(credential) = &self.credential else {
            return Err(RemoteError::MissingCredential);
        };

        let response = http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential.expose_secret())
            .json(&self.request_body(prompt, options, stream))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            let message = extract_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(RemoteError::Provider { status, message });
        }
        Ok(response)
    }

    /// One-shot completion: the full answer or an error.
    pub async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, RemoteError> {
        let response = self.send(prompt, options, false).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|_| RemoteError::MalformedResponse)?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or(RemoteError::MalformedResponse)
    }

    /// Streaming completion: text fragments are sent over `tx` as they
    /// decode, terminated by [`StreamEvent::Done`] on the end marker.
    ///
    /// Errors establishing the request are returned; once the stream is
    /// open, failures arrive as [`StreamEvent::Error`] so partial output
    /// survives. A receiver that hangs up stops the stream silently.
    pub async fn stream(
        &self,
        prompt: &str,
        options: &CompletionOptions,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), RemoteError> {
        use futures_util::StreamExt;

        let response = self.send(prompt, options, true).await?;
        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                    return Ok(());
                }
            };
            buffer.extend_from_slice(&chunk);
            if buffer.len() > MAX_SSE_BUFFER_BYTES {
                let _ = tx
                    .send(StreamEvent::Error("stream buffer exceeded maximum size".to_string()))
                    .await;
                return Ok(());
            }

            while let Some(event) = drain_next_sse_event(&mut buffer) {
                let Ok(event) = std::str::from_utf8(&event) else {
                    // Skip, per the lenient streaming contract.
                    continue;
                };
                let Some(data) = extract_sse_data(event) else {
                    continue;
                };
                if data == "[DONE]" {
                    let _ = tx.send(StreamEvent::Done).await;
                    return Ok(());
                }
                match serde_json::from_str::<Value>(&data) {
                    Ok(payload) => {
                        if let Some(delta) = payload
                            .pointer("/choices/0/delta/content")
                            .and_then(Value::as_str)
                            .filter(|delta| !delta.is_empty())
                            && tx.send(StreamEvent::Delta(delta.to_string())).await.is_err()
                        {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        tracing::debug!(%e, payload_bytes = data.len(), "Skipping unparseable stream chunk");
                    }
                }
            }
        }

        let _ = tx
            .send(StreamEvent::Error(
                "connection closed before stream completed".to_string(),
            ))
            .await;
        Ok(())
    }
}

/// Pull the human-readable message out of a provider error body.
fn extract_error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    payload
        .pointer("/error/message")
        .or_else(|| payload.pointer("/message"))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(ToString::to_string)
}

/// Locate the next SSE event boundary (`\n\n` or `\r\n\r\n`), whichever
/// comes first.
fn find_sse_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n");
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n");
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a <= b { (a, 2) } else { (b, 4) }),
        (Some(a), None) => Some((a, 2)),
        (None, Some(b)) => Some((b, 4)),
        (None, None) => None,
    }
}

fn drain_next_sse_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (pos, delim_len) = find_sse_event_boundary(buffer)?;
    let event = buffer[..pos].to_vec();
    buffer.drain(..pos + delim_len);
    Some(event)
}

/// Join the `data:` lines of one SSE event.
fn extract_sse_data(event: &str) -> Option<String> {
    let mut data = String::new();
    let mut found = false;
    for line in event.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix("data:") {
            if found {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            found = true;
        }
    }
    found.then_some(data)
}

#[cfg(test)]
mod tests {
    use super::{
        CompletionOptions, RemoteClient, RemoteError, StreamEvent, drain_next_sse_event,
        extract_error_message, extract_sse_data,
    };
    use sidekick_types::{ApiCredential, RemoteModel};
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RemoteClient {
        RemoteClient::new(
            RemoteModel::new("gpt-4o-mini"),
            Some(ApiCredential::new("sk-test").unwrap()),
        )
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "hello" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi there" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client(&server)
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "hi there");
    }

    #[tokio::test]
    async fn missing_credential_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = RemoteClient::new(RemoteModel::default(), None).with_base_url(server.uri());
        let err = client
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::MissingCredential));
    }

    #[tokio::test]
    async fn provider_error_carries_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap_err();
        match err {
            RemoteError::Provider { status, message } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn response_without_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "object": "list" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::MalformedResponse));
    }

    #[tokio::test]
    async fn streaming_skips_garbage_and_terminates_on_done() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: this is not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        );
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(16);
        client(&server)
            .stream("hello", &CompletionOptions::default(), tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo".to_string()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn streaming_reports_truncated_stream() {
        let server = MockServer::start().await;
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n";
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(16);
        client(&server)
            .stream("hello", &CompletionOptions::default(), tx)
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::Delta("partial".to_string()))
        );
        assert!(matches!(rx.recv().await, Some(StreamEvent::Error(_))));
    }

    mod sse {
        use super::{drain_next_sse_event, extract_sse_data};

        #[test]
        fn drains_events_in_order() {
            let mut buffer = b"data: a\n\ndata: b\r\n\r\nrest".to_vec();
            assert_eq!(drain_next_sse_event(&mut buffer), Some(b"data: a".to_vec()));
            assert_eq!(drain_next_sse_event(&mut buffer), Some(b"data: b".to_vec()));
            assert_eq!(drain_next_sse_event(&mut buffer), None);
            assert_eq!(buffer, b"rest");
        }

        #[test]
        fn joins_multiline_data() {
            assert_eq!(
                extract_sse_data("data: one\ndata: two"),
                Some("one\ntwo".to_string())
            );
        }

        #[test]
        fn ignores_non_data_fields() {
            assert_eq!(extract_sse_data("event: ping\nid: 7"), None);
            assert_eq!(
                extract_sse_data("event: message\ndata: payload"),
                Some("payload".to_string())
            );
        }
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            extract_error_message("{\"error\":{\"message\":\"bad key\"}}"),
            Some("bad key".to_string())
        );
        assert_eq!(
            extract_error_message("{\"message\":\"plain\"}"),
            Some("plain".to_string())
        );
        assert_eq!(extract_error_message("not json"), None);
    }
}
