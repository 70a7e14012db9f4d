//! Session Integration Tests
//!
//! Exercises the session event loop against a scripted engine transport:
//! - Search and book round trips through the full command surface
//! - Double-submission defense while a turn is in flight
//! - Response timeout, late-reply draining and turn retry
//! - Reset cancelling deferred book moves
//!
//! No test here depends on a real engine binary.

use std::sync::Arc;
use std::time::Duration;

use shakmaty::Color;

use persona_chess::game::book::OpeningBook;
use persona_chess::game::error::GameError;
use persona_chess::game::personality::Personality;
use persona_chess::game::session::GameSession;
use persona_chess::game::status::{EndReason, GameStatus};
use uci_channel::transport::testing::{scripted_pair, Harness};
use uci_channel::EngineChannel;

const FEN_AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

async fn connect_scripted() -> (EngineChannel, Harness) {
    let (reader, writer, harness) = scripted_pair();
    harness.to_channel.send("uciok".to_string()).unwrap();
    harness.to_channel.send("readyok".to_string()).unwrap();
    let channel = EngineChannel::connect(
        Box::new(reader),
        Box::new(writer),
        Duration::from_secs(5),
    )
    .await
    .expect("scripted handshake");
    (channel, harness)
}

/// A personality forced onto the search path (book disabled)
fn searcher(id: &str) -> Personality {
    let mut personality = Personality::by_id(id).unwrap();
    personality.opening_book = OpeningBook::new();
    personality
}

/// Answer every `go` with the next scripted best move
fn spawn_engine_script(mut harness: Harness, replies: Vec<&'static str>) {
    tokio::spawn(async move {
        let mut replies = replies.into_iter();
        while let Some(line) = harness.from_channel.recv().await {
            if line.starts_with("go") {
                if let Some(best) = replies.next() {
                    let _ = harness.to_channel.send(format!("bestmove {best}"));
                }
            }
        }
    });
}

#[tokio::test]
async fn test_session_search_round_trip() {
    let (channel, harness) = connect_scripted().await;
    spawn_engine_script(harness, vec!["e7e5"]);
    let session = GameSession::spawn_seeded(searcher("grinder"), Color::White, channel, 1);

    let snapshot = session
        .submit_player_move("e2", "e4", None)
        .await
        .expect("turn completes once the engine replies");

    assert_eq!(snapshot.fen, FEN_AFTER_E4_E5);
    assert_eq!(snapshot.ply, 2);
    assert!(!snapshot.is_thinking);
    assert_eq!(snapshot.last_move.unwrap().uci, "e7e5");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_session_book_reply_after_cosmetic_delay() {
    let (channel, _harness) = connect_scripted().await;
    let session = GameSession::spawn_seeded(
        Personality::by_id("grinder").unwrap(),
        Color::White,
        channel,
        7,
    );

    // the grinder's only booked reply to 1.e4 is 1...e5; the cosmetic
    // delay elapses on the paused clock without real waiting
    let snapshot = session.submit_player_move("e2", "e4", None).await.unwrap();
    assert_eq!(snapshot.ply, 2);
    assert_eq!(snapshot.fen, FEN_AFTER_E4_E5);
    assert_eq!(snapshot.last_move.unwrap().uci, "e7e5");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_black_human_gets_opponent_first_move() {
    let (channel, _harness) = connect_scripted().await;
    let session = GameSession::spawn_seeded(
        Personality::by_id("professor").unwrap(),
        Color::Black,
        channel,
        3,
    );

    let mut snapshots = session.snapshots();
    loop {
        if snapshots.borrow_and_update().ply >= 1 {
            break;
        }
        snapshots.changed().await.expect("session alive");
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.ply, 1);
    assert_eq!(snapshot.turn, Color::Black);
    assert!(!snapshot.is_thinking);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timeout_then_retry_recovers_the_turn() {
    let (channel, mut harness) = connect_scripted().await;

    // silent on the first search; the late reply lands at t+15s, well
    // after the response timeout; the retry's search is answered at once
    tokio::spawn(async move {
        let mut gos = 0u32;
        while let Some(line) = harness.from_channel.recv().await {
            if line.starts_with("go") {
                gos += 1;
                if gos == 1 {
                    let to = harness.to_channel.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(15)).await;
                        let _ = to.send("bestmove g8f6".to_string());
                    });
                } else {
                    let _ = harness.to_channel.send("bestmove e7e5".to_string());
                }
            }
        }
    });

    let session = Arc::new(GameSession::spawn_seeded(
        searcher("jester"),
        Color::White,
        channel,
        5,
    ));

    let submitting = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_player_move("e2", "e4", None).await })
    };

    // wait until the player move committed and the search is in flight
    let mut snapshots = session.snapshots();
    loop {
        if snapshots.borrow_and_update().is_thinking {
            break;
        }
        snapshots.changed().await.expect("session alive");
    }

    // a second submission while the turn is in flight is rejected
    let second = session.submit_player_move("d2", "d4", None).await;
    assert!(matches!(second, Err(GameError::DoubleSubmission { .. })));

    // the silent engine trips the response timeout
    let first = submitting.await.unwrap();
    assert!(matches!(first, Err(GameError::EngineUnavailable { .. })));
    assert!(session.snapshot().is_thinking, "the turn stays open");

    // retry until the stale reply has drained, then the turn completes
    let snapshot = loop {
        match session.retry_opponent().await {
            Ok(snapshot) => break snapshot,
            Err(GameError::EngineUnavailable { .. }) => {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => panic!("unexpected retry failure: {e}"),
        }
    };
    assert_eq!(snapshot.fen, FEN_AFTER_E4_E5);
    assert_eq!(snapshot.ply, 2);

    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown().await,
        Err(_) => panic!("session handle still shared"),
    }
}

#[tokio::test]
async fn test_none_reply_surfaces_engine_unavailable() {
    let (channel, harness) = connect_scripted().await;
    spawn_engine_script(harness, vec!["(none)"]);
    let session = GameSession::spawn_seeded(searcher("grinder"), Color::White, channel, 2);

    let result = session.submit_player_move("e2", "e4", None).await;
    assert!(matches!(result, Err(GameError::EngineUnavailable { .. })));
    assert!(session.snapshot().is_thinking, "the turn stays open for retry");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_scheduled_book_move() {
    let (channel, _harness) = connect_scripted().await;
    let session = Arc::new(GameSession::spawn_seeded(
        Personality::by_id("grinder").unwrap(),
        Color::White,
        channel,
        9,
    ));

    let submitting = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_player_move("e2", "e4", None).await })
    };

    // once the move committed, the book reply is scheduled but not applied
    let mut snapshots = session.snapshots();
    loop {
        if snapshots.borrow_and_update().is_thinking {
            break;
        }
        snapshots.changed().await.expect("session alive");
    }

    let after_reset = session.reset().await.unwrap();
    assert_eq!(after_reset.ply, 0);

    // the superseded turn reports its cancellation
    let result = submitting.await.unwrap();
    assert!(matches!(result, Err(GameError::InvalidState { .. })));

    // even after the old delay would have elapsed, the fresh board is
    // untouched: the stale scheduled move never lands
    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.ply, 0);
    assert!(!snapshot.is_thinking);
    assert!(snapshot.last_move.is_none());

    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown().await,
        Err(_) => panic!("session handle still shared"),
    }
}

#[tokio::test]
async fn test_resign_through_session() {
    let (channel, _harness) = connect_scripted().await;
    let session = GameSession::spawn_seeded(
        Personality::by_id("firebrand").unwrap(),
        Color::White,
        channel,
        4,
    );

    let snapshot = session.resign().await.unwrap();
    assert_eq!(
        snapshot.status,
        GameStatus::Ended(EndReason::Resignation {
            winner: Color::Black
        })
    );

    let result = session.submit_player_move("e2", "e4", None).await;
    assert!(matches!(result, Err(GameError::GameOver { .. })));

    session.shutdown().await;
}
