//! Completion client: send the prompt to the chat-completions endpoint.
//!
//! Prompt wording lives in [`crate::prompts`]. The HTTP contract is fixed by
//! the endpoint:
//!
//! ```text
//! POST <endpoint>
//! Authorization: Bearer <api key>
//! HTTP-Referer:  <referer>
//! X-Title:       <title>
//!
//! {"model": …, "messages": [{"role": "user", "content": <prompt>}],
//!  "temperature": 0.3, "top_p": 0.9}
//! ```
//!
//! ## Failure policy
//!
//! One attempt, no retries. Every failure is returned as a [`ClientError`]
//! value; nothing is raised past the caller. Callers that only want
//! something to show the user can use
//! [`AnnotationClient::generate_annotation_text`], which never fails.

use crate::config::AnnotationConfig;
use crate::error::{AnnotateError, ClientError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for the completion endpoint.
///
/// Holds its own copy of everything it sends, so it can outlive the config
/// it was built from.
#[derive(Clone)]
pub struct AnnotationClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    referer: String,
    title: String,
    temperature: f64,
    top_p: f64,
}

impl std::fmt::Debug for AnnotationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnnotationClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    /// [`AnnotateError::MissingApiKey`] if no key is configured, and
    /// [`AnnotateError::Internal`] if the TLS backend cannot be initialised.
    pub fn new(config: &AnnotationConfig) -> Result<Self, AnnotateError> {
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AnnotateError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    /// Request an annotation for `prompt`.
    ///
    /// Returns the first completion's message content on HTTP 200.
    pub async fn generate_annotation(&self, prompt: &str) -> Result<String, ClientError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            top_p: self.top_p,
        };

        debug!(
            "POST {} (model {}, {} prompt chars)",
            self.endpoint,
            self.model,
            prompt.chars().count()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        debug!(
            "Completion answered HTTP {} with {} bytes in {:?}",
            status.as_u16(),
            text.len(),
            start.elapsed()
        );

        if status != StatusCode::OK {
            warn!("Completion API returned HTTP {}", status.as_u16());
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }

    /// Request an annotation, folding any failure into its message.
    ///
    /// The returned string is either the annotation or a human-readable
    /// description of what went wrong; use [`Self::generate_annotation`]
    /// when the difference matters.
    pub async fn generate_annotation_text(&self, prompt: &str) -> String {
        match self.generate_annotation(prompt).await {
            Ok(annotation) => annotation,
            Err(e) => e.to_string(),
        }
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    let mut message = if e.is_timeout() {
        format!("timed out: {e}")
    } else {
        e.to_string()
    };
    // reqwest's Display stops at the top level; the OS reason sits in the
    // source chain.
    let mut cause = std::error::Error::source(&e);
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = std::error::Error::source(inner);
    }
    warn!("Completion request failed: {}", message);
    ClientError::Transport { message }
}

/// Pull `choices[0].message.content` out of a 200 body.
fn parse_completion(body: &str) -> Result<String, ClientError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse {
            detail: e.to_string(),
        })?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ClientError::MalformedResponse {
            detail: "response has no choices".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    const PATH: &str = "/api/v1/chat/completions";

    fn config_for(server: &MockServer) -> AnnotationConfig {
        AnnotationConfig::builder()
            .api_key("test-key")
            .endpoint(server.url(PATH))
            .build()
            .unwrap()
    }

    #[test]
    fn parse_completion_extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"first"}},
                       {"message":{"role":"assistant","content":"second"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "first");
    }

    #[test]
    fn parse_completion_rejects_wrong_shapes() {
        for body in [
            "",
            "not json",
            r#"{"choices":[]}"#,
            r#"{"choices":[{"text":"legacy"}]}"#,
            r#"{"error":{"message":"quota"}}"#,
        ] {
            assert!(
                matches!(parse_completion(body), Err(ClientError::MalformedResponse { .. })),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn new_requires_api_key() {
        let config = AnnotationConfig::default();
        assert!(matches!(
            AnnotationClient::new(&config),
            Err(AnnotateError::MissingApiKey)
        ));
    }

    #[test]
    fn debug_hides_api_key() {
        let config = AnnotationConfig::builder().api_key("sk-or-xyz").build().unwrap();
        let client = AnnotationClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("sk-or-xyz"));
    }

    #[tokio::test]
    async fn returns_embedded_content_on_200() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(json!({
                    "id": "gen-1",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "В статье исследуется…"}
                    }]
                }));
            })
            .await;

        let client = AnnotationClient::new(&config_for(&server)).unwrap();
        let annotation = client.generate_annotation("prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(annotation, "В статье исследуется…");
    }

    #[tokio::test]
    async fn sends_headers_and_body_contract() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PATH)
                    .header("Authorization", "Bearer test-key")
                    .header("HTTP-Referer", "https://your-site-url.com")
                    .header("X-Title", "Scientific_Annotation_App")
                    .json_body(json!({
                        "model": "google/gemma-2-9b-it:free",
                        "messages": [{"role": "user", "content": "Hello article"}],
                        "temperature": 0.3,
                        "top_p": 0.9
                    }));
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "ok"}}]}));
            })
            .await;

        let client = AnnotationClient::new(&config_for(&server)).unwrap();
        let annotation = client.generate_annotation("Hello article").await.unwrap();

        mock.assert_async().await;
        assert_eq!(annotation, "ok");
    }

    #[tokio::test]
    async fn non_200_embeds_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(500).body("server error");
            })
            .await;

        let client = AnnotationClient::new(&config_for(&server)).unwrap();
        let err = client.generate_annotation("prompt").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Http {
                status: 500,
                body: "server error".into()
            }
        );

        let text = client.generate_annotation_text("prompt").await;
        assert!(text.contains("500"), "got: {text}");
        assert!(text.contains("server error"), "got: {text}");
    }

    #[tokio::test]
    async fn malformed_200_is_an_error_not_an_annotation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(json!({"unexpected": true}));
            })
            .await;

        let client = AnnotationClient::new(&config_for(&server)).unwrap();
        let err = client.generate_annotation("prompt").await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn network_fault_is_returned_not_raised() {
        // Grab a free port and release it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = AnnotationConfig::builder()
            .api_key("test-key")
            .endpoint(format!("http://127.0.0.1:{port}{PATH}"))
            .build()
            .unwrap();

        let client = AnnotationClient::new(&config).unwrap();
        let err = client.generate_annotation("prompt").await.unwrap_err();
        let ClientError::Transport { ref message } = err else {
            panic!("expected transport error, got {err:?}");
        };
        assert!(
            message.to_lowercase().contains("refused"),
            "transport message lacks the OS cause: {message}"
        );

        let text = client.generate_annotation_text("prompt").await;
        assert!(text.contains(message.as_str()), "got: {text}");
    }
}
