use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use chess_core::board::BoardState;
use chess_core::proposer::{
    parse_proposal_text, MoveProposal, MoveProposer, ProposalContext, ProposerError,
};
use chess_core::references::{scan_tags, ReferenceClassifier};
use chess_core::shakmaty::{Role, Square};

use crate::config::Config;
use crate::prompts;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic messages API. Implements the move-proposer
/// boundary and the implicit-reference classifier; everything it returns is
/// re-validated by the core.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(config: &Config, api_key: String) -> Self {
        let client = Client::builder()
            .user_agent("ChatChess/1.0")
            .timeout(Duration::from_secs(config.proposer_timeout_secs))
            .build()
            .unwrap();
        Self {
            client,
            api_key,
            model: config.anthropic_model.clone(),
            base_url: config.anthropic_base_url.clone(),
        }
    }

    /// Send one prompt through the messages API and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ProposerError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1024,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProposerError::Timeout
                } else {
                    ProposerError::Transport(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(ProposerError::Transport(format!("HTTP {}", resp.status())));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| ProposerError::Malformed(e.to_string()))?;

        data.get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProposerError::Malformed("no text content in reply".to_string()))
    }
}

#[async_trait]
impl MoveProposer for AnthropicClient {
    async fn propose(&self, ctx: &ProposalContext<'_>) -> Result<MoveProposal, ProposerError> {
        let prompt = prompts::piece_prompt(ctx);
        tracing::debug!(square = %ctx.square, "Sending piece prompt");

        let text = self.complete(&prompt).await?;
        tracing::debug!(square = %ctx.square, "Received proposer reply");

        Ok(parse_proposal_text(&text))
    }
}

#[async_trait]
impl ReferenceClassifier for AnthropicClient {
    async fn classify(
        &self,
        message: &str,
        board: &BoardState,
    ) -> Result<Vec<(Square, Role)>, ProposerError> {
        let prompt = prompts::classify_prompt(message, board);
        let text = self.complete(&prompt).await?;
        Ok(scan_tags(&text))
    }
}
