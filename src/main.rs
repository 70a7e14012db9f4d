//! Terminal front end for persona-chess
//!
//! A minimal UI collaborator over the session handle: reads coordinate
//! moves from stdin, prints the board after every transition, and maps the
//! orchestration errors onto user hints ("try a different move" versus
//! "the opponent cannot respond").

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, BufReader};

use persona_chess::game::{GameError, GameSession, Personality, SessionHandle, Snapshot};
use uci_channel::{EngineChannel, ProcessTransport};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "persona-chess", about = "Play chess against engine personalities")]
struct Args {
    /// UCI engine binary to play against
    #[arg(long, default_value = "stockfish")]
    engine: String,

    /// Opponent personality id
    #[arg(long, default_value = "grinder")]
    personality: String,

    /// Side the human plays: white or black
    #[arg(long, default_value = "white")]
    color: String,

    /// List the built-in personalities and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for name in Personality::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let personality = Personality::by_id(&args.personality)
        .ok_or_else(|| anyhow!("unknown personality {:?}; try --list", args.personality))?;
    let human_color = match args.color.to_ascii_lowercase().as_str() {
        "white" | "w" => Color::White,
        "black" | "b" => Color::Black,
        other => return Err(anyhow!("unknown color {other:?}; use white or black")),
    };

    let (reader, writer) = ProcessTransport::spawn(&args.engine)
        .with_context(|| format!("failed to launch engine {:?}", args.engine))?;
    let channel = EngineChannel::connect(Box::new(reader), Box::new(writer), HANDSHAKE_TIMEOUT)
        .await
        .context("engine handshake failed")?;
    info!("[MAIN] engine {} ready", args.engine);

    let session = GameSession::spawn(personality, human_color, channel);

    println!(
        "Playing {:?} against {:?}. Moves as coordinates (e2e4, e7e8q);",
        human_color, args.personality
    );
    println!("commands: moves <sq>, retry, reset, resign, quit");
    render(&session.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = session.snapshot();
        if snapshot.status.is_over() {
            println!("{}", snapshot.status.message());
            println!("(reset to play again, quit to exit)");
        } else if snapshot.is_thinking {
            println!("{} is thinking...", snapshot.personality);
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "exit" => break,
            "reset" => {
                apply_outcome(session.reset().await);
            }
            "resign" => {
                apply_outcome(session.resign().await);
            }
            "retry" => {
                apply_outcome(session.retry_opponent().await);
            }
            _ if input.starts_with("moves ") => {
                let square = input.trim_start_matches("moves ").trim();
                match session.legal_destinations(square).await {
                    Ok(destinations) if destinations.is_empty() => {
                        println!("no moves from {square}");
                    }
                    Ok(destinations) => println!("{square}: {}", destinations.join(" ")),
                    Err(e) => println!("error: {e}"),
                }
            }
            mv => submit(&session, mv).await,
        }
    }

    session.shutdown().await;
    Ok(())
}

/// Submit a coordinate move like `e2e4` or `e7e8q`
async fn submit(session: &SessionHandle, mv: &str) {
    if mv.len() < 4 || mv.len() > 5 || !mv.is_ascii() {
        println!("unrecognized input {mv:?} (expected e.g. e2e4, or a command)");
        return;
    }
    let from = &mv[0..2];
    let to = &mv[2..4];
    let promotion = mv.chars().nth(4);

    apply_outcome(session.submit_player_move(from, to, promotion).await);
}

fn apply_outcome(result: Result<Snapshot, GameError>) {
    match result {
        Ok(snapshot) => render(&snapshot),
        Err(GameError::IllegalMove { uci }) => {
            println!("illegal move {uci}; try a different move");
        }
        Err(GameError::EngineUnavailable { message }) => {
            println!("the opponent cannot respond ({message});");
            println!("retry, resign or reset");
        }
        Err(e) => println!("error: {e}"),
    }
}

/// Print the board from the snapshot's FEN
fn render(snapshot: &Snapshot) {
    let placement = snapshot.fen.split_whitespace().next().unwrap_or("");
    println!();
    for (i, rank) in placement.split('/').enumerate() {
        print!("{} |", 8 - i);
        for c in rank.chars() {
            if let Some(n) = c.to_digit(10) {
                for _ in 0..n {
                    print!(" .");
                }
            } else {
                print!(" {c}");
            }
        }
        println!();
    }
    println!("   a b c d e f g h");
    let last = snapshot
        .last_move
        .as_ref()
        .map(|m| m.uci.clone())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "ply {} | {:?} to move | last {} | material {:+}",
        snapshot.ply, snapshot.turn, last, snapshot.material_advantage
    );
}
