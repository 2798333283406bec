//! Move proposer boundary: the contract the core validates against.
//!
//! The proposer is an opaque async function (an LLM underneath) that turns a
//! position, a piece identity and free text into a candidate move plus
//! narrative. Nothing it returns is trusted: the resolution loop re-validates
//! every token against the board before applying it.

use async_trait::async_trait;
use regex::Regex;
use shakmaty::{Role, Square};
use std::sync::LazyLock;

use crate::board::BoardState;

/// Substituted when the proposer's reply carries no recognizable move.
pub const FALLBACK_NARRATIVE: &str =
    "I couldn't generate a valid move based on that command. Let's try something else.";

/// Substituted when the proposer call itself fails (timeout, transport,
/// malformed reply).
pub const APOLOGY_NARRATIVE: &str =
    "Sorry, I encountered an error while generating a response.";

/// Used by [`NullProposer`] when no credential is configured.
pub const UNCONFIGURED_NARRATIVE: &str =
    "No API key is configured, so this piece is standing by.";

#[derive(Debug, thiserror::Error)]
pub enum ProposerError {
    #[error("proposal request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed proposer response: {0}")]
    Malformed(String),
}

/// Parsed boundary output. `token: None` means the piece does not move this
/// turn; the narrative is always present.
#[derive(Debug, Clone)]
pub struct MoveProposal {
    pub token: Option<String>,
    pub narrative: String,
}

/// Context handed to the proposer for one piece. The board is an immutable
/// snapshot; the proposer cannot mutate shared state through it.
pub struct ProposalContext<'a> {
    pub board: &'a BoardState,
    pub square: Square,
    pub piece_type: Role,
    pub message: &'a str,
    /// Pre-computed SAN legal moves for the piece, for prompt construction.
    pub legal_moves: Vec<String>,
}

#[async_trait]
pub trait MoveProposer: Send + Sync {
    async fn propose(&self, ctx: &ProposalContext<'_>) -> Result<MoveProposal, ProposerError>;
}

static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)MOVE:\s*(\S+)").unwrap());

/// Parse raw proposer text into the boundary contract.
///
/// `MOVE:<token>` yields a move with the remaining lines as narrative.
/// `MOVE:None` means the piece deliberately stays put and the narrative is
/// kept, as does an `INVALID` reply. Anything else yields no move and the
/// fixed fallback narrative.
pub fn parse_proposal_text(text: &str) -> MoveProposal {
    if let Some(cap) = MOVE_RE.captures(text) {
        let token: String = cap[1]
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '=')
            .to_string();

        let narrative = text
            .lines()
            .skip(1)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        let narrative = if narrative.is_empty() {
            text.trim().to_string()
        } else {
            narrative
        };

        if token.is_empty() || token.eq_ignore_ascii_case("none") {
            return MoveProposal {
                token: None,
                narrative,
            };
        }
        return MoveProposal {
            token: Some(token),
            narrative,
        };
    }

    if text.contains("INVALID") {
        return MoveProposal {
            token: None,
            narrative: text.replacen("INVALID", "", 1).trim().to_string(),
        };
    }

    MoveProposal {
        token: None,
        narrative: FALLBACK_NARRATIVE.to_string(),
    }
}

/// Always-"no move" stub, selected when no LLM credential is available. The
/// pipeline keeps working; every piece politely declines to move.
pub struct NullProposer;

#[async_trait]
impl MoveProposer for NullProposer {
    async fn propose(&self, _ctx: &ProposalContext<'_>) -> Result<MoveProposal, ProposerError> {
        Ok(MoveProposal {
            token: None,
            narrative: UNCONFIGURED_NARRATIVE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_with_explanation() {
        let reply = "MOVE:e4\nOnward! One step at a time.";
        let proposal = parse_proposal_text(reply);
        assert_eq!(proposal.token.as_deref(), Some("e4"));
        assert_eq!(proposal.narrative, "Onward! One step at a time.");
    }

    #[test]
    fn test_parse_strips_brackets_and_punctuation() {
        let proposal = parse_proposal_text("move: [Nf3].\nA clever hop.");
        assert_eq!(proposal.token.as_deref(), Some("Nf3"));

        let castle = parse_proposal_text("MOVE:O-O\nTo safety!");
        assert_eq!(castle.token.as_deref(), Some("O-O"));
    }

    #[test]
    fn test_parse_none_sentinel_keeps_narrative() {
        let proposal = parse_proposal_text("MOVE:None\nI shall hold my ground.");
        assert!(proposal.token.is_none());
        assert_eq!(proposal.narrative, "I shall hold my ground.");
    }

    #[test]
    fn test_parse_invalid_reply() {
        let proposal = parse_proposal_text("INVALID There is no way forward from here.");
        assert!(proposal.token.is_none());
        assert_eq!(proposal.narrative, "There is no way forward from here.");
    }

    #[test]
    fn test_parse_unrecognized_reply_uses_fallback() {
        let proposal = parse_proposal_text("The knight ponders the meaning of the board.");
        assert!(proposal.token.is_none());
        assert_eq!(proposal.narrative, FALLBACK_NARRATIVE);
    }
}
