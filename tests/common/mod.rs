//! Shared helpers for the turn-resolution integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chess_core::proposer::{MoveProposal, MoveProposer, ProposalContext, ProposerError};

#[allow(dead_code)]
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// What the scripted proposer should do when asked about a given square.
#[allow(dead_code)]
pub enum Reply {
    Move(&'static str, &'static str),
    Stay(&'static str),
    Fail,
}

/// Scripted proposer keyed by square. Pieces without a script politely stay,
/// which also covers the random opponent piece in most scenarios.
pub struct ScriptedProposer {
    replies: HashMap<String, Reply>,
}

impl ScriptedProposer {
    pub fn new(replies: Vec<(&str, Reply)>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(sq, r)| (sq.to_string(), r))
                .collect(),
        }
    }
}

#[async_trait]
impl MoveProposer for ScriptedProposer {
    async fn propose(&self, ctx: &ProposalContext<'_>) -> Result<MoveProposal, ProposerError> {
        match self.replies.get(&ctx.square.to_string()) {
            Some(Reply::Move(token, msg)) => Ok(MoveProposal {
                token: Some((*token).to_string()),
                narrative: (*msg).to_string(),
            }),
            Some(Reply::Stay(msg)) => Ok(MoveProposal {
                token: None,
                narrative: (*msg).to_string(),
            }),
            Some(Reply::Fail) => Err(ProposerError::Timeout),
            None => Ok(MoveProposal {
                token: None,
                narrative: "Standing by.".to_string(),
            }),
        }
    }
}
