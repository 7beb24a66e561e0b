use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use std::env;
use std::net::{IpAddr, SocketAddr};
use url::Url;

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

/// Default system prompt for the chat assistant
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "あなたはFAQとGoogleカレンダーの編集をサポートするアシスタントです。";

/// Default upload limit (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Settings for the chat completion client
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// OpenAI API key
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// System prompt sent ahead of every conversation
    pub system_prompt: String,
}

/// Settings for the calendar webhook client
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Google Apps Script endpoint that performs calendar mutations
    pub url: Url,
}

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    pub chat: ChatConfig,
    pub webhook: WebhookConfig,
    /// Address to bind the HTTP server to
    pub host: IpAddr,
    pub port: u16,
    /// Maximum accepted request body size
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from the `.env` file and the process environment
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // The frontend build used to share its key with the backend
        let api_key = get("OPENAI_API_KEY")
            .or_else(|| get("REACT_APP_CHATGPT_API_KEY"))
            .ok_or_else(|| env_error("OPENAI_API_KEY"))?;

        let model = get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let system_prompt =
            get("CHAT_SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let gas_url = get("GAS_URL").ok_or_else(|| env_error("GAS_URL"))?;
        let url = parse_webhook_url(&gas_url)?;

        let host = match get("HOST") {
            Some(host) => host
                .parse::<IpAddr>()
                .map_err(|_| config_error(&format!("Invalid HOST format: {}", host)))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| config_error(&format!("Invalid PORT format: {}", port)))?,
            None => 8000,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(limit) => limit.parse::<usize>().map_err(|_| {
                config_error(&format!("Invalid MAX_UPLOAD_BYTES format: {}", limit))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            chat: ChatConfig {
                api_key,
                model,
                system_prompt,
            },
            webhook: WebhookConfig { url },
            host,
            port,
            max_upload_bytes,
        })
    }

    /// Socket address the server listens on
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_webhook_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw).map_err(|e| config_error(&format!("Invalid GAS_URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(config_error(&format!(
            "GAS_URL must use http or https, got {}",
            other
        ))),
    }
}
