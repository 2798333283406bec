//! End-to-end turn-resolution scenarios: a scripted proposer stands in for
//! the LLM boundary and a seeded RNG makes the opponent step deterministic.

mod common;

use chess_core::board::BoardState;
use chess_core::proposer::APOLOGY_NARRATIVE;
use chess_core::resolve::{resolve_turn, ResolveError};
use chess_core::shakmaty::{Color, Role, Square};
use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{Reply, ScriptedProposer, START_FEN};

#[tokio::test]
async fn test_pawn_advance_end_to_end() {
    let board = BoardState::from_fen(START_FEN).unwrap();
    let proposer = ScriptedProposer::new(vec![("e2", Reply::Move("e2e4", "Charge!"))]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "@e2P advance", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    assert_eq!(resolution.outcomes[0].piece, "P at e2");
    assert_eq!(resolution.outcomes[0].mv.as_deref(), Some("e2e4"));
    assert_eq!(resolution.outcomes[0].message, "Charge!");

    let after = &resolution.board;
    assert_eq!(after.piece_at(Square::E4).map(|p| p.role), Some(Role::Pawn));
    assert!(after.piece_at(Square::E2).is_none());
    assert!(!resolution.game_over);

    // The opponent step always runs and gets its own outcome; side to move
    // ends up with Black after the forced-turn opponent cycle.
    assert_eq!(resolution.outcomes.len(), 2);
    assert!(resolution.outcomes[1].mv.is_none());
    assert_eq!(after.side_to_move(), Color::Black);
}

#[tokio::test]
async fn test_type_mismatch_rejects_batch() {
    let board = BoardState::from_fen(START_FEN).unwrap();
    let proposer = ScriptedProposer::new(vec![("b1", Reply::Move("b1c3", "Gallop!"))]);
    let mut rng = StdRng::seed_from_u64(1);

    // b1 holds a knight; the tag claims a queen.
    let err = resolve_turn(&board, "@b1Q strike", Color::White, &proposer, &mut rng)
        .await
        .unwrap_err();

    let ResolveError::InvalidReferences(invalid) = err;
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].square, Square::B1);
    assert_eq!(invalid[0].expected_type, Role::Queen);

    // Nothing was applied.
    assert_eq!(board.fen(), START_FEN);
}

#[tokio::test]
async fn test_king_capture_halts_resolution() {
    // White queen a8, black king h8: the capture is not rules-legal but the
    // queen attacks the square, so the lenient path applies it.
    let board = BoardState::from_fen("Q6k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let proposer = ScriptedProposer::new(vec![
        ("a8", Reply::Move("a8h8", "The throne falls!")),
        ("h8", Reply::Move("h8g8", "Flee!")),
    ]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "@a8Q end this", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    assert!(resolution.game_over);
    // No opponent move after the game ends.
    assert_eq!(resolution.outcomes.len(), 1);
    assert_eq!(resolution.outcomes[0].mv.as_deref(), Some("a8h8"));
    assert!(resolution.board.is_game_over());
}

#[tokio::test]
async fn test_proposer_failure_degrades_and_loop_continues() {
    let board = BoardState::from_fen(START_FEN).unwrap();
    let proposer = ScriptedProposer::new(vec![
        ("e2", Reply::Fail),
        ("d2", Reply::Move("d2d4", "March!")),
    ]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "@e2P @d2P forward", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    assert!(resolution.outcomes[0].mv.is_none());
    assert_eq!(resolution.outcomes[0].message, APOLOGY_NARRATIVE);

    assert_eq!(resolution.outcomes[1].mv.as_deref(), Some("d2d4"));
    let after = &resolution.board;
    assert_eq!(after.piece_at(Square::D4).map(|p| p.role), Some(Role::Pawn));
    assert_eq!(after.piece_at(Square::E2).map(|p| p.role), Some(Role::Pawn));
}

#[tokio::test]
async fn test_illegal_proposal_dropped_with_narrative_kept() {
    let board = BoardState::from_fen(START_FEN).unwrap();
    let proposer = ScriptedProposer::new(vec![("e2", Reply::Move("e2e5", "Overreach!"))]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "@e2P leap", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    assert!(resolution.outcomes[0].mv.is_none());
    assert_eq!(resolution.outcomes[0].message, "Overreach!");
    let after = &resolution.board;
    assert_eq!(after.piece_at(Square::E2).map(|p| p.role), Some(Role::Pawn));
    assert!(after.piece_at(Square::E5).is_none());
}

#[tokio::test]
async fn test_opponent_moves_exactly_once() {
    // Black has a single piece, so the random pick is forced.
    let board = BoardState::from_fen("k7/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let proposer = ScriptedProposer::new(vec![("a8", Reply::Move("a8a7", "Repositioning."))]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "no tags here", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    assert_eq!(resolution.outcomes.len(), 1);
    assert_eq!(resolution.outcomes[0].piece, "K at a8");
    assert_eq!(resolution.outcomes[0].mv.as_deref(), Some("a8a7"));
    assert_eq!(
        resolution.board.piece_at(Square::A7).map(|p| p.role),
        Some(Role::King)
    );
    assert!(!resolution.game_over);
}

#[tokio::test]
async fn test_outcome_wire_shape() {
    let board = BoardState::from_fen(START_FEN).unwrap();
    let proposer = ScriptedProposer::new(vec![("e2", Reply::Move("e2e4", "Charge!"))]);
    let mut rng = StdRng::seed_from_u64(1);

    let resolution = resolve_turn(&board, "@e2P go", Color::White, &proposer, &mut rng)
        .await
        .unwrap();

    // The outcome serializes with a `move` key, null when no move applied.
    let applied = serde_json::to_value(&resolution.outcomes[0]).unwrap();
    assert_eq!(applied["move"], "e2e4");
    assert_eq!(applied["piece"], "P at e2");

    let declined = serde_json::to_value(&resolution.outcomes[1]).unwrap();
    assert!(declined["move"].is_null());
}
