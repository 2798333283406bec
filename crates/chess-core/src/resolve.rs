//! Turn resolution: sequences proposals for every referenced piece, applies
//! each legal suggestion in order, then lets one opponent piece respond.
//!
//! The loop is the only component that mutates the working position, and it
//! does so strictly sequentially: each piece sees the board left by the
//! previous piece's move. Suspension points are exactly the proposer calls.

use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use shakmaty::{Color, Piece, Role, Square};

use crate::board::BoardState;
use crate::proposer::{MoveProposal, MoveProposer, ProposalContext, ProposerError, APOLOGY_NARRATIVE};
use crate::references::{parse_piece_references, InvalidReference, PieceReference};

/// Recorded when an earlier move in the same batch already displaced the
/// referenced piece.
pub const GONE_NARRATIVE: &str =
    "This piece is no longer on its square, so it sits this turn out.";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// At least one tag did not match the board. The whole message is
    /// rejected before any move is attempted.
    #[error("invalid piece references: {}", describe(.0))]
    InvalidReferences(Vec<InvalidReference>),
}

fn describe(refs: &[InvalidReference]) -> String {
    refs.iter()
        .map(|r| format!("no {} at {}", r.expected_type.upper_char(), r.square))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One chat-log entry per processed reference (and one for the opponent).
/// A dropped or failed move still produces an entry, so the player always
/// sees feedback.
#[derive(Debug, Clone, Serialize)]
pub struct PieceOutcome {
    pub piece: String,
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub message: String,
}

#[derive(Debug)]
pub struct TurnResolution {
    pub board: BoardState,
    pub outcomes: Vec<PieceOutcome>,
    pub game_over: bool,
}

/// Resolve one chat message against `board`.
///
/// References are processed in extraction order; each piece proposes with the
/// side to move forced to `player`, so several of one player's pieces can act
/// within a single chat turn. Every returned token is re-validated against
/// the board before it is applied; illegal ones are dropped with the
/// narrative kept. After the batch, one opponent piece chosen through `rng`
/// gets a single propose/apply cycle. A captured king short-circuits
/// everything.
pub async fn resolve_turn<P, R>(
    board: &BoardState,
    message: &str,
    player: Color,
    proposer: &P,
    rng: &mut R,
) -> Result<TurnResolution, ResolveError>
where
    P: MoveProposer + ?Sized,
    R: Rng,
{
    // Absorbing terminal state: a finished game accepts no further input.
    if board.is_game_over() {
        return Ok(TurnResolution {
            board: board.clone(),
            outcomes: Vec::new(),
            game_over: true,
        });
    }

    let extracted = parse_piece_references(message, board);
    if !extracted.invalid.is_empty() {
        return Err(ResolveError::InvalidReferences(extracted.invalid));
    }

    let mut working = board.clone();
    let mut outcomes = Vec::new();

    for reference in &extracted.references {
        working = working.with_side_to_move(player);

        if !piece_present(&working, reference) {
            outcomes.push(skipped_outcome(reference));
            continue;
        }

        let proposal = propose_for(proposer, &working, reference, message).await;
        let (next, outcome) = settle(&working, reference, proposal);
        working = next;
        outcomes.push(outcome);

        if working.is_game_over() {
            return Ok(TurnResolution {
                board: working,
                outcomes,
                game_over: true,
            });
        }
    }

    Ok(opponent_step(proposer, rng, working, outcomes, !player).await)
}

/// Parallel-proposal variant: all player proposals are issued concurrently
/// against the pre-batch snapshot, then the returned tokens are applied one
/// at a time in original reference order. Apply order is deterministic
/// regardless of proposer response latency; each apply re-checks presence
/// and legality against the board the previous apply left behind.
pub async fn resolve_turn_parallel<P, R>(
    board: &BoardState,
    message: &str,
    player: Color,
    proposer: &P,
    rng: &mut R,
) -> Result<TurnResolution, ResolveError>
where
    P: MoveProposer + ?Sized,
    R: Rng,
{
    if board.is_game_over() {
        return Ok(TurnResolution {
            board: board.clone(),
            outcomes: Vec::new(),
            game_over: true,
        });
    }

    let extracted = parse_piece_references(message, board);
    if !extracted.invalid.is_empty() {
        return Err(ResolveError::InvalidReferences(extracted.invalid));
    }

    let snapshot = board.with_side_to_move(player);
    let proposals = join_all(
        extracted
            .references
            .iter()
            .map(|reference| propose_for(proposer, &snapshot, reference, message)),
    )
    .await;

    let mut working = board.clone();
    let mut outcomes = Vec::new();

    for (reference, proposal) in extracted.references.iter().zip(proposals) {
        working = working.with_side_to_move(player);

        if !piece_present(&working, reference) {
            outcomes.push(skipped_outcome(reference));
            continue;
        }

        let (next, outcome) = settle(&working, reference, proposal);
        working = next;
        outcomes.push(outcome);

        if working.is_game_over() {
            return Ok(TurnResolution {
                board: working,
                outcomes,
                game_over: true,
            });
        }
    }

    Ok(opponent_step(proposer, rng, working, outcomes, !player).await)
}

/// The opponent replies exactly once per chat message: one piece, chosen
/// uniformly at random among the opponent's pieces, gets a single
/// propose/apply cycle.
async fn opponent_step<P, R>(
    proposer: &P,
    rng: &mut R,
    mut working: BoardState,
    mut outcomes: Vec<PieceOutcome>,
    opponent: Color,
) -> TurnResolution
where
    P: MoveProposer + ?Sized,
    R: Rng,
{
    working = working.with_side_to_move(opponent);

    if let Some((square, piece)) = pick_random_piece(&working, opponent, rng) {
        let reference = PieceReference {
            square,
            piece_type: piece.role,
        };
        let directive = format!(
            "{} at {}: Make a strategic move",
            piece.role.upper_char(),
            square
        );
        let proposal = propose_for(proposer, &working, &reference, &directive).await;
        let (next, outcome) = settle(&working, &reference, proposal);
        working = next;
        outcomes.push(outcome);
    }

    let game_over = working.is_game_over();
    TurnResolution {
        board: working,
        outcomes,
        game_over,
    }
}

fn piece_label(piece_type: Role, square: Square) -> String {
    format!("{} at {}", piece_type.upper_char(), square)
}

/// A reference stays valid only while a piece of the claimed type sits on
/// its square; an earlier move in the same batch may have captured or moved
/// it.
fn piece_present(board: &BoardState, reference: &PieceReference) -> bool {
    board.piece_at(reference.square).map(|p| p.role) == Some(reference.piece_type)
}

fn skipped_outcome(reference: &PieceReference) -> PieceOutcome {
    PieceOutcome {
        piece: piece_label(reference.piece_type, reference.square),
        mv: None,
        message: GONE_NARRATIVE.to_string(),
    }
}

async fn propose_for<P>(
    proposer: &P,
    board: &BoardState,
    reference: &PieceReference,
    message: &str,
) -> Result<MoveProposal, ProposerError>
where
    P: MoveProposer + ?Sized,
{
    let ctx = ProposalContext {
        board,
        square: reference.square,
        piece_type: reference.piece_type,
        message,
        legal_moves: board.legal_moves_san(reference.square),
    };
    proposer.propose(&ctx).await
}

/// Apply one proposal to the working board. An illegal or unparseable token
/// is dropped silently while the narrative is kept; a failed boundary call
/// degrades to the fixed apologetic narrative. The batch never aborts here.
fn settle(
    board: &BoardState,
    reference: &PieceReference,
    proposal: Result<MoveProposal, ProposerError>,
) -> (BoardState, PieceOutcome) {
    let piece = piece_label(reference.piece_type, reference.square);
    match proposal {
        Ok(MoveProposal {
            token: Some(token),
            narrative,
        }) => match board.apply_move(&token) {
            Ok(next) => (
                next,
                PieceOutcome {
                    piece,
                    mv: Some(token),
                    message: narrative,
                },
            ),
            Err(_) => (
                board.clone(),
                PieceOutcome {
                    piece,
                    mv: None,
                    message: narrative,
                },
            ),
        },
        Ok(MoveProposal {
            token: None,
            narrative,
        }) => (
            board.clone(),
            PieceOutcome {
                piece,
                mv: None,
                message: narrative,
            },
        ),
        Err(_) => (
            board.clone(),
            PieceOutcome {
                piece,
                mv: None,
                message: APOLOGY_NARRATIVE.to_string(),
            },
        ),
    }
}

fn pick_random_piece<R: Rng>(
    board: &BoardState,
    color: Color,
    rng: &mut R,
) -> Option<(Square, Piece)> {
    let pieces = board.pieces_of(color);
    if pieces.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..pieces.len());
    pieces.into_iter().nth(idx)
}
