//! Board state holder: single source of truth for one position during a
//! resolution cycle.
//!
//! Wraps a raw `shakmaty::Setup` instead of `shakmaty::Chess` so that two
//! off-book states stay representable: forced side-to-move edits that leave
//! the side not to move in check, and positions where a king has been
//! captured. A full `Chess` position is materialized on demand for legality
//! questions, relaxing what `shakmaty` lets us relax.

use shakmaty::{
    attacks,
    fen::Fen,
    san::San,
    uci::UciMove,
    Bitboard, CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, Piece, Position,
    PositionError, Role, Setup, Square,
};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("unrecognized move token: {0}")]
    BadMoveToken(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// A complete chess position, serializable as FEN.
///
/// Value type: mutating operations return a new `BoardState` and never touch
/// the receiver, so snapshots handed to the proposer boundary cannot be
/// corrupted by later moves.
#[derive(Debug, Clone)]
pub struct BoardState {
    setup: Setup,
}

impl BoardState {
    /// The standard initial position.
    pub fn startpos() -> Self {
        Self {
            setup: Chess::default().into_setup(EnPassantMode::Legal),
        }
    }

    /// Parse a FEN string. Placement-only validity is enforced (syntax, square
    /// counts); chess-level invariants such as "both kings present" are not,
    /// because the game-over representation deliberately violates them.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| BoardError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self {
            setup: parsed.into_setup(),
        })
    }

    pub fn fen(&self) -> String {
        Fen::from_setup(self.setup.clone()).to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.setup.turn
    }

    /// Forced side-to-move override on the serialized representation, leaving
    /// the placement untouched. A stale en-passant square from the other
    /// side's last move is dropped along with the flip.
    pub fn with_side_to_move(&self, color: Color) -> Self {
        let mut setup = self.setup.clone();
        if setup.turn != color {
            setup.turn = color;
            setup.ep_square = None;
        }
        Self { setup }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.setup.board.piece_at(square)
    }

    /// All pieces of one color, in ascending square order.
    pub fn pieces_of(&self, color: Color) -> Vec<(Square, Piece)> {
        self.setup
            .board
            .by_color(color)
            .into_iter()
            .filter_map(|sq| self.setup.board.piece_at(sq).map(|piece| (sq, piece)))
            .collect()
    }

    /// True iff either side's king is absent. This is the termination rule:
    /// no checkmate or stalemate detection.
    pub fn is_game_over(&self) -> bool {
        self.setup.board.king_of(Color::White).is_none()
            || self.setup.board.king_of(Color::Black).is_none()
    }

    /// Materialize a rules-checked position, relaxing the errors that forced
    /// side-to-move edits routinely produce. `None` means the position cannot
    /// host legal moves at all (e.g. a king is missing).
    fn position(&self) -> Option<Chess> {
        Chess::from_setup(self.setup.clone(), CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_too_much_material)
            .or_else(PositionError::ignore_impossible_check)
            .ok()
    }

    /// Rules-legal moves for the piece on `square`. Empty for an empty
    /// square, for a piece of the side not to move, or when the position
    /// cannot be materialized.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        let Some(pos) = self.position() else {
            return Vec::new();
        };
        pos.legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(square))
            .collect()
    }

    /// SAN rendering of `legal_moves_from`, used to seed proposer prompts.
    pub fn legal_moves_san(&self, square: Square) -> Vec<String> {
        let Some(pos) = self.position() else {
            return Vec::new();
        };
        pos.legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(square))
            .map(|m| San::from_move(&pos, &m).to_string())
            .collect()
    }

    /// Attempt a proposed move token against this position.
    ///
    /// Accepts coordinate (`e2e4`, `e7e8q`) and algebraic (`Nf3`, `exd5`,
    /// `O-O`) forms, trying the coordinate reading first. On success returns
    /// the resulting position; the receiver is never mutated.
    ///
    /// Legality is evaluated leniently in exactly one case: a coordinate move
    /// whose destination holds the enemy king is accepted when the moving
    /// piece attacks that square. Rules-legal movegen never produces king
    /// captures, but forced side-to-move positions make them reachable, and
    /// a captured king is what ends the game.
    pub fn apply_move(&self, token: &str) -> Result<BoardState, BoardError> {
        let token = token
            .trim()
            .trim_end_matches(['+', '#', '.', ',', '!', '?']);
        if token.is_empty() {
            return Err(BoardError::BadMoveToken(String::new()));
        }

        let uci = token.parse::<UciMove>().ok();
        let san = token.parse::<San>().ok();
        if uci.is_none() && san.is_none() {
            return Err(BoardError::BadMoveToken(token.to_string()));
        }

        let pos = self.position();

        if let (Some(pos), Some(uci)) = (pos.as_ref(), uci.as_ref()) {
            if let Ok(mv) = uci.to_move(pos) {
                return Ok(self.play(pos.clone(), mv));
            }
        }
        if let (Some(pos), Some(san)) = (pos.as_ref(), san.as_ref()) {
            if let Ok(mv) = san.to_move(pos) {
                return Ok(self.play(pos.clone(), mv));
            }
        }

        if let Some(UciMove::Normal { from, to, .. }) = uci {
            if let Some(next) = self.capture_king(from, to) {
                return Ok(next);
            }
        }

        Err(BoardError::IllegalMove(token.to_string()))
    }

    fn play(&self, mut pos: Chess, mv: Move) -> BoardState {
        pos.play_unchecked(&mv);
        BoardState {
            setup: pos.into_setup(EnPassantMode::Legal),
        }
    }

    /// Lenient king capture, applied at the placement level.
    fn capture_king(&self, from: Square, to: Square) -> Option<BoardState> {
        let mover = self.setup.board.piece_at(from)?;
        if mover.color != self.setup.turn {
            return None;
        }
        let victim = self.setup.board.piece_at(to)?;
        if victim.role != Role::King || victim.color == mover.color {
            return None;
        }
        if !attacks::attacks(from, mover, self.setup.board.occupied()).contains(to) {
            return None;
        }

        let mut setup = self.setup.clone();
        setup.board.remove_piece_at(to);
        if let Some(piece) = setup.board.remove_piece_at(from) {
            setup.board.set_piece_at(to, piece);
        }
        setup.castling_rights =
            setup.castling_rights & !Bitboard::from(from) & !Bitboard::from(to);
        setup.ep_square = None;
        setup.halfmoves = 0;
        if setup.turn == Color::Black {
            setup.fullmoves = setup.fullmoves.saturating_add(1);
        }
        setup.turn = !setup.turn;
        Some(BoardState { setup })
    }
}
