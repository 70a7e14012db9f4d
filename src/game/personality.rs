//! Opponent personality definitions
//!
//! A personality is an immutable bundle of search tuning (per-phase depth
//! table, UCI skill/contempt), temperament (aggression, thinking-time
//! band) and its own opening book. It is selected once per game and never
//! mutated; everything the engine side does differently between opponents
//! flows from these numbers.
//!
//! # Built-in roster
//!
//! | Id        | Style                 | Depth (base) | Book cutoff |
//! |-----------|-----------------------|--------------|-------------|
//! | firebrand | sharp attacker        | 7            | 8 plies     |
//! | professor | deep theoretician     | 8            | 12 plies    |
//! | grinder   | endgame technician    | 6            | 6 plies     |
//! | jester    | fast, erratic novice  | 3            | 4 plies     |
//!
//! Personalities are plain data and round-trip through serde, so a front
//! end can ship its own roster as JSON instead of using the built-ins.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::book::{BookEntry, OpeningBook, WeightedMove};

/// A named opponent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personality {
    pub id: String,
    /// Depth when no phase rule applies
    pub base_depth: u8,
    /// Depth during the opening phase
    pub opening_depth: u8,
    /// Depth in tactical middlegame positions
    pub tactical_depth: u8,
    /// Depth in positional middlegame positions
    pub positional_depth: u8,
    /// Depth once the endgame is reached
    pub endgame_depth: u8,
    /// Boost applied to the personality's signature book continuation
    pub aggression_factor: f32,
    /// Forwarded as the UCI `Contempt` option
    pub contempt: i32,
    /// Forwarded as the UCI `Skill Level` option
    pub skill_level: u8,
    /// Cosmetic thinking-time band in seconds
    pub think_time_min: f32,
    pub think_time_max: f32,
    /// Multiplier applied to the band while serving book moves
    pub opening_speed: f32,
    /// Consult the opening book while ply <= this cutoff; deeper for more
    /// theoretical personalities
    pub book_depth: u32,
    pub opening_book: OpeningBook,
}

impl Personality {
    /// All built-in personalities
    pub fn roster() -> Vec<Personality> {
        vec![firebrand(), professor(), grinder(), jester()]
    }

    /// Look a built-in up by id
    pub fn by_id(id: &str) -> Option<Personality> {
        Self::roster().into_iter().find(|p| p.id == id)
    }

    /// Ids of the built-in roster, for CLI listings
    pub fn names() -> Vec<String> {
        Self::roster().into_iter().map(|p| p.id).collect()
    }

    /// Draw a cosmetic thinking delay for a book move
    ///
    /// Uniform in the personality's band, scaled by `opening_speed`. Pure
    /// pacing; correctness never depends on it.
    pub fn draw_thinking_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let base = if self.think_time_max > self.think_time_min {
            rng.random_range(self.think_time_min..self.think_time_max)
        } else {
            self.think_time_min
        };
        Duration::from_secs_f32((base * self.opening_speed).max(0.0))
    }
}

// Position keys for the built-in books. The 3-field form is used for
// post-opening positions so en-passant encoding differences cannot miss.
const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq";
const AFTER_D4: &str = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq";
const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq";
const AFTER_E4_E5_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq";

fn entry(white: Vec<WeightedMove>, black: Vec<WeightedMove>) -> BookEntry {
    BookEntry { white, black }
}

fn firebrand() -> Personality {
    let mut book = OpeningBook::new();
    book.insert(
        START,
        entry(vec![WeightedMove::new("e2e4", 3.0)], vec![]),
    );
    book.insert(
        AFTER_E4,
        entry(
            vec![],
            vec![
                WeightedMove::new("c7c5", 2.0),
                WeightedMove::new("e7e5", 1.0),
            ],
        ),
    );
    book.insert(
        AFTER_D4,
        entry(
            vec![],
            vec![
                WeightedMove::new("g8f6", 2.0),
                WeightedMove::new("d7d5", 1.0),
            ],
        ),
    );

    Personality {
        id: "firebrand".to_string(),
        base_depth: 7,
        opening_depth: 5,
        tactical_depth: 10,
        positional_depth: 6,
        endgame_depth: 7,
        aggression_factor: 0.9,
        contempt: 35,
        skill_level: 15,
        think_time_min: 0.4,
        think_time_max: 1.5,
        opening_speed: 0.5,
        book_depth: 8,
        opening_book: book,
    }
}

fn professor() -> Personality {
    let mut book = OpeningBook::new();
    book.insert(
        START,
        entry(
            vec![
                WeightedMove::new("e2e4", 2.0),
                WeightedMove::new("d2d4", 2.0),
                WeightedMove::new("c2c4", 1.0),
            ],
            vec![],
        ),
    );
    book.insert(
        AFTER_E4,
        entry(
            vec![],
            vec![
                WeightedMove::new("e7e5", 3.0),
                WeightedMove::new("e7e6", 1.0),
            ],
        ),
    );
    book.insert(
        AFTER_D4,
        entry(
            vec![],
            vec![
                WeightedMove::new("d7d5", 2.0),
                WeightedMove::new("g8f6", 2.0),
            ],
        ),
    );
    book.insert(
        AFTER_E4_E5,
        entry(vec![WeightedMove::new("g1f3", 1.0)], vec![]),
    );
    book.insert(
        AFTER_E4_E5_NF3,
        entry(vec![], vec![WeightedMove::new("b8c6", 1.0)]),
    );

    Personality {
        id: "professor".to_string(),
        base_depth: 8,
        opening_depth: 6,
        tactical_depth: 9,
        positional_depth: 10,
        endgame_depth: 9,
        aggression_factor: 0.2,
        contempt: -5,
        skill_level: 20,
        think_time_min: 1.2,
        think_time_max: 3.0,
        opening_speed: 0.9,
        book_depth: 12,
        opening_book: book,
    }
}

fn grinder() -> Personality {
    let mut book = OpeningBook::new();
    book.insert(
        START,
        entry(
            vec![
                WeightedMove::new("d2d4", 2.0),
                WeightedMove::new("c2c4", 1.0),
            ],
            vec![],
        ),
    );
    book.insert(
        AFTER_E4,
        entry(vec![], vec![WeightedMove::new("e7e5", 1.0)]),
    );
    book.insert(
        AFTER_D4,
        entry(vec![], vec![WeightedMove::new("d7d5", 1.0)]),
    );

    Personality {
        id: "grinder".to_string(),
        base_depth: 6,
        opening_depth: 4,
        tactical_depth: 7,
        positional_depth: 7,
        endgame_depth: 11,
        aggression_factor: 0.35,
        contempt: 0,
        skill_level: 12,
        think_time_min: 0.8,
        think_time_max: 2.2,
        opening_speed: 1.0,
        book_depth: 6,
        opening_book: book,
    }
}

fn jester() -> Personality {
    let mut book = OpeningBook::new();
    book.insert(
        START,
        entry(
            vec![
                WeightedMove::new("e2e4", 1.0),
                WeightedMove::new("g1f3", 1.0),
                WeightedMove::new("c2c4", 1.0),
            ],
            vec![],
        ),
    );
    book.insert(
        AFTER_E4,
        entry(vec![], vec![WeightedMove::new("e7e5", 1.0)]),
    );
    book.insert(
        AFTER_D4,
        entry(vec![], vec![WeightedMove::new("g8f6", 1.0)]),
    );

    Personality {
        id: "jester".to_string(),
        base_depth: 3,
        opening_depth: 2,
        tactical_depth: 4,
        positional_depth: 3,
        endgame_depth: 3,
        aggression_factor: 0.7,
        contempt: 20,
        skill_level: 3,
        think_time_min: 0.2,
        think_time_max: 0.8,
        opening_speed: 0.4,
        book_depth: 4,
        opening_book: book,
    }
}
