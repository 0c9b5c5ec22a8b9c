use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::prompt_builder::PromptBuilder;
use crate::model::config::{EndpointConfig, RequestStyle};
use crate::model::message::Message;

/// Tokens requested when checking a key; the reply itself is thrown away.
const PROBE_MAX_TOKENS: u32 = 5;
const PROBE_TEMPERATURE: f32 = 0.6;
/// How much of an error body ends up in the message shown to the player.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Anything that can continue a conversation by one assistant message.
pub trait Generator {
    fn complete(&self, transcript: &[Message]) -> Result<Message, GenerationError>;

    /// Check the backend accepts our credentials.
    fn verify(&self) -> Result<(), GenerationError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Blocking client for a chat-completion style endpoint.
pub struct ChatClient {
    http: Client,
    endpoint: EndpointConfig,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(endpoint: EndpointConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        if endpoint.style == RequestStyle::ChatCompletions && api_key.is_none() {
            return Err(GenerationError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    fn send(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<Message, GenerationError> {
        let req = self.http.post(&self.endpoint.url);

        let req = match self.endpoint.style {
            RequestStyle::ChatCompletions => {
                let body = ChatCompletionRequest {
                    model: &self.endpoint.model,
                    messages,
                    temperature,
                    max_tokens,
                };
                let req = req.json(&body);
                match &self.api_key {
                    Some(key) => req.bearer_auth(key),
                    None => req,
                }
            }
            RequestStyle::Relay => req.json(messages),
        };

        let resp = req.send().map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        debug!("raw completion body: {body}");
        reply_from_body(&body)
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout {
                secs: self.endpoint.timeout_secs,
            }
        } else {
            GenerationError::Network(e.to_string())
        }
    }
}

impl Generator for ChatClient {
    fn complete(&self, transcript: &[Message]) -> Result<Message, GenerationError> {
        info!(
            "requesting completion ({} messages, model {})",
            transcript.len(),
            self.endpoint.model
        );
        self.send(transcript, self.endpoint.temperature, None)
    }

    /// Send a tiny conversation to prove the endpoint accepts our key.
    fn verify(&self) -> Result<(), GenerationError> {
        info!("verifying API key against {}", self.endpoint.url);
        self.send(&PromptBuilder::probe(), PROBE_TEMPERATURE, Some(PROBE_MAX_TOKENS))
            .map(|_| ())
    }
}

/// Pull `choices[0].message` out of a chat-completion body.
fn reply_from_body(body: &str) -> Result<Message, GenerationError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::InvalidResponse("no choices[0].message content".into()))?;

    Ok(Message::assistant(content))
}

fn api_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.error.message;
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > ERROR_BODY_LIMIT {
        let cut: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{cut}…")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Role;

    #[test]
    fn request_body_keeps_transcript_order() {
        let messages = vec![
            Message::system("rules"),
            Message::user("start"),
            Message::assistant("Plot: x"),
        ];
        let body = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: 0.7,
            max_tokens: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        let roles: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();

        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn reads_first_choice_message() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Plot: hi\n1. a" } },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
            ]
        }"#;

        let msg = reply_from_body(body).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Plot: hi\n1. a");
    }

    #[test]
    fn missing_choices_is_invalid_response() {
        assert!(matches!(
            reply_from_body(r#"{"choices": []}"#),
            Err(GenerationError::InvalidResponse(_))
        ));
        assert!(matches!(
            reply_from_body(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(GenerationError::InvalidResponse(_))
        ));
        assert!(matches!(
            reply_from_body("<html>bad gateway</html>"),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn api_errors_prefer_structured_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");

        let long = "x".repeat(ERROR_BODY_LIMIT + 50);
        assert_eq!(api_error_message(&long).chars().count(), ERROR_BODY_LIMIT + 1);
    }

    #[test]
    fn chat_completions_needs_a_key() {
        let endpoint = EndpointConfig::default();
        assert!(matches!(
            ChatClient::new(endpoint, None),
            Err(GenerationError::MissingApiKey)
        ));

        let relay = EndpointConfig {
            style: RequestStyle::Relay,
            ..EndpointConfig::default()
        };
        assert!(ChatClient::new(relay, None).is_ok());
    }
}
