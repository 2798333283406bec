use axum::{Extension, Json};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use chess_core::board::BoardState;
use chess_core::proposer::MoveProposer;
use chess_core::references::{filter_classified, scan_tags, ReferenceClassifier};
use chess_core::resolve::{resolve_turn, resolve_turn_parallel, PieceOutcome};
use chess_core::shakmaty::Color;

use crate::clients::anthropic::AnthropicClient;
use crate::config::Config;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub board: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub moves: Vec<PieceOutcome>,
    pub fen: String,
    pub game_over: bool,
}

/// POST /api/chat
/// Resolve one chat message against the supplied position. The player moves
/// as White; one Black piece replies.
pub async fn chat(
    Extension(config): Extension<Config>,
    Extension(proposer): Extension<Arc<dyn MoveProposer>>,
    Extension(classifier): Extension<Option<Arc<AnthropicClient>>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    tracing::info!(board = %req.board, "Received chat message");

    let board = BoardState::from_fen(&req.board)?;

    let message =
        expand_implicit_references(&req.message, &board, classifier.as_deref()).await;

    let mut rng = StdRng::from_entropy();
    let resolution = if config.parallel_proposals {
        resolve_turn_parallel(&board, &message, Color::White, proposer.as_ref(), &mut rng)
            .await?
    } else {
        resolve_turn(&board, &message, Color::White, proposer.as_ref(), &mut rng).await?
    };

    tracing::info!(
        applied = resolution.outcomes.iter().filter(|o| o.mv.is_some()).count(),
        game_over = resolution.game_over,
        "Resolved chat message"
    );

    Ok(Json(ChatResponse {
        moves: resolution.outcomes,
        fen: resolution.board.fen(),
        game_over: resolution.game_over,
    }))
}

/// Extended-mode extraction: when the message carries no explicit tags, ask
/// the classifier to produce some and splice them into the message. The
/// extractor re-validates the spliced tags like any others, so a classifier
/// failure can only cost coverage, never correctness.
async fn expand_implicit_references(
    message: &str,
    board: &BoardState,
    classifier: Option<&AnthropicClient>,
) -> String {
    let Some(classifier) = classifier else {
        return message.to_string();
    };
    if !scan_tags(message).is_empty() {
        return message.to_string();
    }

    match classifier.classify(message, board).await {
        Ok(candidates) => {
            let refs = filter_classified(candidates, board, Color::White);
            if refs.is_empty() {
                return message.to_string();
            }
            let tags: Vec<String> = refs
                .iter()
                .map(|r| format!("@{}{}", r.square, r.piece_type.upper_char()))
                .collect();
            tracing::info!(tags = %tags.join(" "), "Classifier resolved implicit references");
            format!("{} {}", message, tags.join(" "))
        }
        Err(e) => {
            tracing::warn!("Reference classifier failed: {e}");
            message.to_string()
        }
    }
}
