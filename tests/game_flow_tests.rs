//! Game Flow Integration Tests
//!
//! Tests for full arbitration flows including:
//! - Player move / opponent reply round trips
//! - Turn ordering and double-submission defense
//! - Book-versus-search planning
//! - Depth policy determinism

use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::Color;

use persona_chess::game::arbiter::{Arbiter, MoveOutcome, OpponentPlan, TurnState};
use persona_chess::game::book::{self, BookEntry, OpeningBook, WeightedMove};
use persona_chess::game::error::GameError;
use persona_chess::game::personality::Personality;
use persona_chess::game::phase;
use persona_chess::game::status::GameStatus;

const START_KEY: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";
const FEN_AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

fn arbiter(id: &str, human: Color) -> Arbiter {
    Arbiter::new(Personality::by_id(id).unwrap(), human)
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_player_move_then_synthetic_reply() {
    let mut arbiter = arbiter("professor", Color::White);

    assert_eq!(
        arbiter.submit_player_move("e2", "e4", None).unwrap(),
        MoveOutcome::OpponentToReply
    );
    assert_eq!(
        arbiter.apply_opponent_reply("e7e5").unwrap(),
        MoveOutcome::PlayerToMove
    );

    assert_eq!(arbiter.turn_state(), TurnState::AwaitingPlayerMove);
    assert_eq!(arbiter.fen(), FEN_AFTER_E4_E5);
    assert_eq!(arbiter.ply(), 2);

    let last = arbiter.snapshot().last_move.unwrap();
    assert_eq!((last.from.as_str(), last.to.as_str()), ("e7", "e5"));
}

#[test]
fn test_illegal_player_move_keeps_position() {
    let mut arbiter = arbiter("professor", Color::White);
    let before = arbiter.fen();

    let result = arbiter.submit_player_move("e2", "e5", None);
    assert!(matches!(result, Err(GameError::IllegalMove { .. })));
    assert_eq!(arbiter.fen(), before);
    assert_eq!(arbiter.status(), GameStatus::Playing);
}

#[test]
fn test_turn_ordering_is_enforced() {
    let mut arbiter = arbiter("grinder", Color::White);
    arbiter.submit_player_move("d2", "d4", None).unwrap();

    // while the opponent reply is due, player input is rejected...
    assert!(matches!(
        arbiter.submit_player_move("e2", "e4", None),
        Err(GameError::DoubleSubmission { .. })
    ));

    // ...and after the reply the reply path closes again
    arbiter.apply_opponent_reply("d7d5").unwrap();
    assert!(matches!(
        arbiter.apply_opponent_reply("g8f6"),
        Err(GameError::InvalidState { .. })
    ));
}

#[test]
fn test_reset_twice_equals_reset_once() {
    let mut arbiter = arbiter("firebrand", Color::White);
    arbiter.submit_player_move("e2", "e4", None).unwrap();
    arbiter.apply_opponent_reply("c7c5").unwrap();

    arbiter.reset();
    let once = arbiter.snapshot();
    arbiter.reset();
    let twice = arbiter.snapshot();

    assert_eq!(once.fen, twice.fen);
    assert_eq!(once.ply, 0);
    assert_eq!(twice.ply, 0);
    assert_eq!(once.status, GameStatus::Playing);
    assert_eq!(twice.status, GameStatus::Playing);
}

// ============================================================================
// Book-versus-search planning
// ============================================================================

#[test]
fn test_single_candidate_book_is_deterministic() {
    // a book holding only e2e4 must always serve e2e4, whatever the seed
    let mut book = OpeningBook::new();
    book.insert(
        START_KEY,
        BookEntry {
            white: vec![WeightedMove::new("e2e4", 1.0)],
            black: vec![],
        },
    );
    let mut personality = Personality::by_id("jester").unwrap();
    personality.opening_book = book;

    for seed in [0u64, 1, 42, 1337, 987654321] {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(
            book::select_book_move(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                Color::White,
                &personality,
                &mut rng,
            ),
            Some("e2e4".to_string())
        );
    }
}

#[test]
fn test_opponent_first_move_comes_from_book() {
    let mut arbiter = arbiter("professor", Color::Black);
    let mut rng = StdRng::seed_from_u64(8);

    match arbiter.plan_opponent_reply(&mut rng).unwrap() {
        OpponentPlan::Book { uci, .. } => {
            // the professor opens from its own repertoire
            assert!(["e2e4", "d2d4", "c2c4"].contains(&uci.to_string().as_str()));
        }
        other => panic!("expected book plan for ply 0, got {other:?}"),
    }
}

#[test]
fn test_search_request_carries_personality_directives() {
    let mut personality = Personality::by_id("firebrand").unwrap();
    personality.opening_book = OpeningBook::new();

    let mut arbiter = Arbiter::new(personality, Color::Black);
    let mut rng = StdRng::seed_from_u64(2);
    match arbiter.plan_opponent_reply(&mut rng).unwrap() {
        OpponentPlan::Search { request } => {
            assert_eq!(request.skill_level, 15);
            assert_eq!(request.contempt, 35);
            // ply 0 is the opening
            assert_eq!(request.depth, 5);
            assert!(request.fen.starts_with("rnbqkbnr/pppppppp"));
        }
        other => panic!("expected search plan with an empty book, got {other:?}"),
    }
}

// ============================================================================
// Depth policy
// ============================================================================

#[test]
fn test_pick_depth_is_deterministic_across_personalities() {
    let fen = "r1bqkb1r/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/R1BQKB1R w KQkq - 4 12";
    for personality in Personality::roster() {
        let a = phase::pick_depth(fen, 20, false, &personality);
        let b = phase::pick_depth(fen, 20, false, &personality);
        assert_eq!(a, b, "{} depth must be pure", personality.id);
    }
}

#[test]
fn test_weighted_selection_never_escapes_candidates() {
    // whatever the draw, selection lands on a listed candidate
    let mut book = OpeningBook::new();
    book.insert(
        START_KEY,
        BookEntry {
            white: vec![
                WeightedMove::new("e2e4", 0.5),
                WeightedMove::new("d2d4", 2.5),
                WeightedMove::new("g1f3", 0.1),
            ],
            black: vec![],
        },
    );
    let mut personality = Personality::by_id("grinder").unwrap();
    personality.opening_book = book;

    let listed = ["e2e4", "d2d4", "g1f3"];
    for seed in 0..512u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = book::select_book_move(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Color::White,
            &personality,
            &mut rng,
        )
        .expect("non-empty candidate list always yields a move");
        assert!(listed.contains(&chosen.as_str()));
    }
}
