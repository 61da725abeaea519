//! OpenAI-compatible client for the note assistant.

use {
    secrecy::ExposeSecret,
    tracing::{debug, warn},
};

use notarium_config::AssistantConfig;

use crate::error::ChatError;

/// Sent ahead of every conversation.
const SYSTEM_PROMPT: &str = "You are the assistant built into notarium, a personal notes and \
     tasks app. Help the user think through their notes and tasks. Answer concisely in plain \
     text.";

/// Shared HTTP client.
///
/// All assistant requests reuse this client to share connection pools,
/// DNS cache, and TLS sessions.
fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// Talks to an OpenAI-compatible chat-completions endpoint.
///
/// Constructed once at startup from [`AssistantConfig`] and shared. An
/// unconfigured client (no API key) is valid; it answers every request
/// with [`ChatError::NotConfigured`] so the service runs fine without an
/// assistant.
pub struct AssistantClient {
    api_key: Option<secrecy::Secret<String>>,
    model: String,
    base_url: String,
    client: &'static reqwest::Client,
}

impl AssistantClient {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: shared_http_client(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the assistant for a reply, optionally grounding it in the
    /// plaintext of one note. The caller decrypts; this crate never sees
    /// a key or ciphertext.
    pub async fn reply(
        &self,
        prompt: &str,
        note_context: Option<&str>,
    ) -> Result<String, ChatError> {
        let Some(api_key) = &self.api_key else {
            return Err(ChatError::NotConfigured);
        };

        let body = serde_json::json!({
            "model": self.model,
            "messages": build_messages(prompt, note_context),
        });

        debug!(model = %self.model, with_note = note_context.is_some(), "assistant request");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| ChatError::Upstream(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, body = %body_text, "assistant API error");
            return Err(ChatError::Upstream(format!("HTTP {status}")));
        }

        let payload = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|err| ChatError::Upstream(err.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ChatError::InvalidResponse)
    }
}

fn build_messages(prompt: &str, note_context: Option<&str>) -> Vec<serde_json::Value> {
    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": SYSTEM_PROMPT,
    })];
    if let Some(note) = note_context {
        messages.push(serde_json::json!({
            "role": "system",
            "content": format!("The user is currently viewing this note:\n\n{note}"),
        }));
    }
    messages.push(serde_json::json!({
        "role": "user",
        "content": prompt,
    }));
    messages
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use {
        axum::{Router, extract::Request, http::StatusCode, routing::post},
        secrecy::Secret,
    };

    use super::*;

    /// Start a mock completions server that captures request bodies and
    /// returns the given JSON payload.
    async fn start_mock(reply: serde_json::Value) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        let captured: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let captured_clone = captured.clone();

        let app = Router::new().route(
            "/chat/completions",
            post(move |req: Request| {
                let cap = captured_clone.clone();
                let reply = reply.clone();
                async move {
                    let bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
                        .await
                        .unwrap_or_default();
                    if let Ok(body) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                        cap.lock().unwrap().push(body);
                    }
                    axum::Json(reply)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), captured)
    }

    fn client_for(base_url: &str) -> AssistantClient {
        AssistantClient::from_config(&AssistantConfig {
            api_key: Some(Secret::new("test-key".into())),
            base_url: base_url.into(),
            model: "gpt-4o-mini".into(),
        })
    }

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        })
    }

    #[tokio::test]
    async fn reply_extracts_assistant_text() {
        let (base_url, captured) = start_mock(completion("  hello there  ")).await;

        let reply = client_for(&base_url).reply("hi", None).await.unwrap();
        assert_eq!(reply, "hello there");

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["model"], "gpt-4o-mini");
        let messages = bodies[0]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "hi");
    }

    #[tokio::test]
    async fn note_context_becomes_a_system_message() {
        let (base_url, captured) = start_mock(completion("summarized")).await;

        client_for(&base_url)
            .reply("summarize this", Some("milk, eggs, bread"))
            .await
            .unwrap();

        let bodies = captured.lock().unwrap();
        let messages = bodies[0]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "system");
        assert!(messages[1]["content"]
            .as_str()
            .unwrap()
            .contains("milk, eggs, bread"));
        assert_eq!(messages[2]["content"], "summarize this");
    }

    #[tokio::test]
    async fn unconfigured_client_short_circuits() {
        let client = AssistantClient::from_config(&AssistantConfig::default());
        assert!(!client.is_configured());
        assert!(matches!(
            client.reply("hi", None).await,
            Err(ChatError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn error_status_is_upstream_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let result = client_for(&format!("http://{addr}")).reply("hi", None).await;
        assert!(matches!(result, Err(ChatError::Upstream(_))));
    }

    #[tokio::test]
    async fn missing_completion_text_is_invalid_response() {
        let (base_url, _) = start_mock(serde_json::json!({ "choices": [] })).await;
        let result = client_for(&base_url).reply("hi", None).await;
        assert!(matches!(result, Err(ChatError::InvalidResponse)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = AssistantClient::from_config(&AssistantConfig {
            api_key: None,
            base_url: "https://api.example.com/v1/".into(),
            model: "m".into(),
        });
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }
}
