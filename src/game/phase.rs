//! Game phase classification and adaptive depth policy
//!
//! Classifies the position along two independent axes and maps the result
//! onto the personality's depth table. Both classifications are cheap
//! heuristics: phase comes from the ply counter plus a raw piece count of
//! the FEN placement field (robust against externally loaded positions),
//! and character comes from the check state plus a doubled-pawn scan.
//! Character only nudges depth; it is not an evaluation.
//!
//! Every function here is pure: calling it twice with the same inputs
//! yields the same output, with no hidden counters.

use serde::{Deserialize, Serialize};

use super::personality::Personality;

/// Coarse game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Opening,
    EarlyMiddlegame,
    Middlegame,
    LateMiddlegame,
    Endgame,
}

/// Secondary axis biasing depth selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionCharacter {
    /// An active check is on the board
    Tactical,
    /// Doubled-pawn structure present
    Positional,
    Normal,
}

/// Count the pieces on the board from the FEN placement field
pub fn piece_count(fen: &str) -> u32 {
    placement(fen).chars().filter(|c| c.is_ascii_alphabetic()).count() as u32
}

/// Classify the game phase from ply count and remaining material
pub fn classify_phase(fen: &str, ply: u32) -> GamePhase {
    let pieces = piece_count(fen);
    if ply <= 8 {
        GamePhase::Opening
    } else if ply <= 14 && pieces > 28 {
        GamePhase::EarlyMiddlegame
    } else if pieces > 22 {
        GamePhase::Middlegame
    } else if pieces > 14 {
        GamePhase::LateMiddlegame
    } else {
        GamePhase::Endgame
    }
}

/// Classify the position character
///
/// `in_check` comes from the rule engine (the FEN cannot encode it);
/// doubled pawns are read straight off the placement field. Thresholds are
/// tunable pacing knobs, not contracts.
pub fn classify_character(fen: &str, in_check: bool) -> PositionCharacter {
    if in_check {
        PositionCharacter::Tactical
    } else if has_doubled_pawns(placement(fen)) {
        PositionCharacter::Positional
    } else {
        PositionCharacter::Normal
    }
}

/// Pick the search depth for this position and personality
pub fn pick_depth(fen: &str, ply: u32, in_check: bool, personality: &Personality) -> u8 {
    match classify_phase(fen, ply) {
        GamePhase::Opening => personality.opening_depth,
        GamePhase::Endgame => personality.endgame_depth,
        GamePhase::EarlyMiddlegame | GamePhase::Middlegame | GamePhase::LateMiddlegame => {
            match classify_character(fen, in_check) {
                PositionCharacter::Tactical => personality.tactical_depth,
                PositionCharacter::Positional => personality.positional_depth,
                PositionCharacter::Normal => personality.base_depth,
            }
        }
    }
}

fn placement(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

/// True when any file holds two or more pawns of the same color
fn has_doubled_pawns(placement: &str) -> bool {
    let mut white = [0u8; 8];
    let mut black = [0u8; 8];
    for rank in placement.split('/') {
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else {
                if file >= 8 {
                    break;
                }
                match c {
                    'P' => white[file] += 1,
                    'p' => black[file] += 1,
                    _ => {}
                }
                file += 1;
            }
        }
    }
    white.iter().any(|&n| n >= 2) || black.iter().any(|&n| n >= 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    // 28 pieces: two minor pieces and two pawns traded off
    const TRADED_FEN: &str =
        "r1bqkb1r/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/R1BQKB1R w KQkq - 0 9";
    // bare kings and rooks
    const ENDGAME_FEN: &str = "4k3/8/8/8/8/8/8/R3K2R w KQ - 0 40";
    // doubled white f-pawns
    const DOUBLED_FEN: &str =
        "rnbqkbnr/ppppp1pp/8/8/8/5P2/PPPP1PPP/RNBQKBNR w KQkq - 0 5";

    #[test]
    fn test_piece_count_reads_placement_only() {
        assert_eq!(piece_count(START_FEN), 32);
        assert_eq!(piece_count(ENDGAME_FEN), 4);
        assert_eq!(piece_count(TRADED_FEN), 28);
    }

    #[test]
    fn test_phase_thresholds() {
        assert_eq!(classify_phase(START_FEN, 0), GamePhase::Opening);
        assert_eq!(classify_phase(START_FEN, 8), GamePhase::Opening);
        assert_eq!(classify_phase(START_FEN, 9), GamePhase::EarlyMiddlegame);
        assert_eq!(classify_phase(START_FEN, 14), GamePhase::EarlyMiddlegame);
        assert_eq!(classify_phase(START_FEN, 15), GamePhase::Middlegame);
        // 28 pieces at ply 16 is past the early-middlegame window
        assert_eq!(classify_phase(TRADED_FEN, 16), GamePhase::Middlegame);
        // 16 pieces left
        assert_eq!(
            classify_phase("r2qk2r/pppp4/8/8/8/8/PPPP4/R2QK2R w - - 0 30", 30),
            GamePhase::LateMiddlegame
        );
        assert_eq!(classify_phase(ENDGAME_FEN, 60), GamePhase::Endgame);
    }

    #[test]
    fn test_character_check_beats_structure() {
        assert_eq!(
            classify_character(DOUBLED_FEN, true),
            PositionCharacter::Tactical
        );
        assert_eq!(
            classify_character(DOUBLED_FEN, false),
            PositionCharacter::Positional
        );
        assert_eq!(
            classify_character(START_FEN, false),
            PositionCharacter::Normal
        );
    }

    #[test]
    fn test_doubled_pawns_require_same_file_same_color() {
        // white pawns e4/e5 doubled
        assert!(has_doubled_pawns("4k3/8/8/4P3/4P3/8/8/4K3"));
        // white e4, black e5: same file, different colors
        assert!(!has_doubled_pawns("4k3/8/8/4p3/4P3/8/8/4K3"));
        assert!(!has_doubled_pawns("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"));
    }

    #[test]
    fn test_pick_depth_follows_the_table() {
        let personality = crate::game::personality::Personality::by_id("firebrand").unwrap();

        // opening
        assert_eq!(
            pick_depth(START_FEN, 4, false, &personality),
            personality.opening_depth
        );
        // tactical middlegame
        assert_eq!(
            pick_depth(TRADED_FEN, 20, true, &personality),
            personality.tactical_depth
        );
        // positional middlegame
        assert_eq!(
            pick_depth(DOUBLED_FEN, 20, false, &personality),
            personality.positional_depth
        );
        // quiet middlegame
        assert_eq!(
            pick_depth(TRADED_FEN, 20, false, &personality),
            personality.base_depth
        );
        // endgame wins over character
        assert_eq!(
            pick_depth(ENDGAME_FEN, 60, true, &personality),
            personality.endgame_depth
        );
    }

    #[test]
    fn test_pick_depth_is_pure() {
        let personality = crate::game::personality::Personality::by_id("grinder").unwrap();
        let first = pick_depth(TRADED_FEN, 18, false, &personality);
        let second = pick_depth(TRADED_FEN, 18, false, &personality);
        assert_eq!(first, second);
    }
}
