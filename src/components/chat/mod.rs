use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::providers::openai::Client as OpenAiClient;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ChatConfig;
use crate::error::{bad_request, upstream_error, AppResult};

/// Speaker of a conversation turn
///
/// Any role other than `system` or `user` is read as the assistant, so the
/// web frontend's `bot` turns go through as model replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<String> for ChatRole {
    fn from(role: String) -> Self {
        match role.trim().to_lowercase().as_str() {
            "system" => ChatRole::System,
            "user" => ChatRole::User,
            _ => ChatRole::Assistant,
        }
    }
}

/// One prior turn of the conversation, as sent by the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// A chat model that answers a message given the conversation so far
#[async_trait]
pub trait ChatCompletion: Send + Sync + 'static {
    async fn reply(&self, message: &str, context: &[ChatTurn]) -> AppResult<String>;
}

/// Chat completions through OpenAI, via rig
#[derive(Clone)]
pub struct RigChatClient {
    client: OpenAiClient,
    model: String,
    system_prompt: String,
}

impl RigChatClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: OpenAiClient::new(&config.api_key),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[async_trait]
impl ChatCompletion for RigChatClient {
    async fn reply(&self, message: &str, context: &[ChatTurn]) -> AppResult<String> {
        if message.trim().is_empty() {
            return Err(bad_request("Message must not be empty"));
        }

        let (preamble, history) = split_context(&self.system_prompt, context);
        info!(
            "Sending chat message to {} with {} prior turns",
            self.model,
            history.len()
        );

        let agent = self.client.agent(&self.model).preamble(&preamble).build();

        agent
            .chat(message.to_string(), history)
            .await
            .map_err(|e| {
                error!("Chat completion failed: {}", e);
                upstream_error(&format!("ChatGPT API Error: {}", e))
            })
    }
}

/// Fold client-supplied system turns into the preamble and map the rest
/// to rig messages, preserving order
fn split_context(system_prompt: &str, context: &[ChatTurn]) -> (String, Vec<Message>) {
    let mut preamble = system_prompt.to_string();
    let mut history = Vec::with_capacity(context.len());

    for turn in context {
        match turn.role {
            ChatRole::System => {
                preamble.push_str("\n\n");
                preamble.push_str(&turn.content);
            }
            ChatRole::User => history.push(Message::user(turn.content.clone())),
            ChatRole::Assistant => history.push(Message::assistant(turn.content.clone())),
        }
    }

    (preamble, history)
}
