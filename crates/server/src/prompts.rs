//! Prompt construction for the LLM boundary: the piece roleplay prompt and
//! the implicit-reference classifier prompt. Pure string building; the
//! boundary contract parsing lives in `chess_core::proposer`.

use chess_core::board::BoardState;
use chess_core::proposer::ProposalContext;
use chess_core::shakmaty::Role;

pub struct Personality {
    pub traits: &'static str,
    pub catchphrase: &'static str,
    pub risk_tolerance: &'static str,
}

pub fn personality(role: Role) -> Personality {
    match role {
        Role::Pawn => Personality {
            traits: "Eager rookie soldier, enthusiastic but cautious. Dreams of promotion.",
            catchphrase: "One step at a time!",
            risk_tolerance: "low",
        },
        Role::Knight => Personality {
            traits: "Eccentric special forces operator who loves unconventional tactics.",
            catchphrase: "Let's think outside the box!",
            risk_tolerance: "medium",
        },
        Role::Bishop => Personality {
            traits: "Strategic advisor with a philosophical bent. Thinks in long diagonals.",
            catchphrase: "I see patterns others miss...",
            risk_tolerance: "medium",
        },
        Role::Rook => Personality {
            traits: "Straightforward fortress defender. Values clear lines of attack.",
            catchphrase: "Hold the line!",
            risk_tolerance: "high",
        },
        Role::Queen => Personality {
            traits: "Confident commander who leads from the front. Protective of allies.",
            catchphrase: "Follow my lead!",
            risk_tolerance: "high",
        },
        Role::King => Personality {
            traits: "Wise but sometimes nervous ruler. Deeply values their subjects.",
            catchphrase: "The kingdom depends on us!",
            risk_tolerance: "very low",
        },
    }
}

/// Roleplay prompt for one piece's move proposal.
pub fn piece_prompt(ctx: &ProposalContext<'_>) -> String {
    let p = personality(ctx.piece_type);
    let piece = ctx.piece_type.upper_char();
    let square = ctx.square;
    let turn = if ctx.board.side_to_move().is_white() {
        "White"
    } else {
        "Black"
    };
    let moves = if ctx.legal_moves.is_empty() {
        "(none)".to_string()
    } else {
        ctx.legal_moves.join(", ")
    };

    format!(
        "You are an AI assistant helping to play a chess game.\n\n\
         The player has given this command: \"{message}\"\n\n\
         Current turn: {turn}\n\n\
         You are roleplaying the {piece} at {square}. \
         Personality: {traits} \
         Catchphrase: \"{catchphrase}\" \
         Risk tolerance: {risk}.\n\n\
         Here are the valid moves for the {piece} at {square}:\n{moves}\n\n\
         Based on this command and the valid moves, suggest a chess move for the {piece} at {square}.\n\
         Respond in this format: \"MOVE:[ALGEBRAIC]\" (replace [ALGEBRAIC] with the algebraic notation \
         of the move) followed by a brief explanation of the move.\n\
         If the piece should deliberately stay put, respond with \"MOVE:None\" and stay in character.\n\
         If no valid move is possible based on the command, respond with \"INVALID\" followed by an explanation.\n\n\
         Remember to roleplay as the {piece}. Keep your explanation in character.",
        message = ctx.message,
        traits = p.traits,
        catchphrase = p.catchphrase,
        risk = p.risk_tolerance,
    )
}

/// Prompt asking the model to turn implicit piece mentions into explicit
/// `@<square><PieceLetter>` tags. Output is scanned for tags and filtered
/// against the board afterwards; nothing here is trusted.
pub fn classify_prompt(message: &str, board: &BoardState) -> String {
    format!(
        "You convert chess chat messages into explicit piece tags.\n\n\
         The board FEN is: {fen}\n\n\
         The player said: \"{message}\"\n\n\
         List every one of the player's pieces the message refers to, as tags of the form \
         @<square><PieceLetter> (for example @e2P or @b1N), one per line. \
         Use only squares that actually hold the mentioned pieces. \
         If no piece is referenced, reply with NONE.",
        fen = board.fen(),
    )
}
