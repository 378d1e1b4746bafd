// src/llm/client.rs

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::Config;

const FENCE: &str = "```";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("response contained no completion")]
    NoCompletion,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub prompt_hash: String,
}

/// Anything that turns a prompt into test code.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<Generation, GenerationError>;
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

/// Chat-completions client. One attempt per prompt, no retries.
pub struct LlmClient {
    cfg: Config,
}

impl LlmClient {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }
}

impl Generator for LlmClient {
    fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let prompt_hash = hash_prompt(prompt);

        let client = Client::builder().build()?;

        let resp = client
            .post(&self.cfg.endpoint)
            .bearer_auth(&self.cfg.api_key)
            .json(&build_request(&self.cfg, prompt))
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "(no body)".into());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp.json()?;
        let text = extract_text(&json).ok_or(GenerationError::NoCompletion)?;

        Ok(Generation {
            text: strip_code_fences(text).to_string(),
            prompt_hash,
        })
    }
}

fn build_request<'a>(cfg: &'a Config, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model: &cfg.model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: cfg.max_tokens,
        temperature: cfg.temperature,
    }
}

fn extract_text(v: &Value) -> Option<&str> {
    v.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

fn hash_prompt(prompt: &str) -> String {
    let mut h = Sha256::new();
    h.update(prompt.as_bytes());
    hex::encode(h.finalize())
}

/// Drop one leading and one trailing ``` marker. Anything inside,
/// including a language tag after the opening fence, is kept.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.strip_prefix(FENCE).unwrap_or(text);
    text.strip_suffix(FENCE).unwrap_or(text)
}
