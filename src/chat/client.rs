//! HTTP client for OpenAI-compatible chat-completion endpoints

use super::ChatTransport;
use crate::config::ChatConfig;
use crate::error::TransportError;
use crate::messages::Message;
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Turn a raw HTTP status and body into the assistant reply or an error
///
/// Non-success statuses carry the remote `error.message` when the body has
/// one, otherwise the status text. A success body without
/// `choices[0].message.content` is a `MalformedResponse`.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Message, TransportError> {
    if !status.is_success() {
        let remote_message = serde_json::from_slice::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty());

        let message = remote_message.unwrap_or_else(|| {
            format!(
                "API Error: {}",
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });

        return Err(TransportError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let response: ChatResponse = serde_json::from_slice(body)
        .map_err(|e| TransportError::MalformedResponse(format!("invalid JSON body: {}", e)))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::MalformedResponse("response has no choices".into()))?
        .message
        .ok_or_else(|| TransportError::MalformedResponse("first choice has no message".into()))?
        .content
        .ok_or_else(|| TransportError::MalformedResponse("message has no content".into()))?;

    Ok(Message::assistant(content))
}

/// Chat-completion client
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Issue one POST carrying the whole conversation
    pub async fn send(&self, messages: &[Message]) -> Result<Message, TransportError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
        };

        debug!(
            "Sending {} messages to {} (model {})",
            messages.len(),
            self.config.endpoint,
            self.config.model
        );

        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key));

        if let Some(organization) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            error!("Chat request failed: {}", e);
            TransportError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!("Chat response {} ({} bytes)", status, body.len());

        interpret_response(status, &body)
    }
}

impl ChatTransport for ChatClient {
    fn complete<'a>(
        &'a self,
        messages: &'a [Message],
    ) -> BoxFuture<'a, Result<Message, TransportError>> {
        Box::pin(self.send(messages))
    }
}
