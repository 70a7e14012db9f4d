//! Weighted opening book lookup and selection
//!
//! A book maps canonical position keys to per-side weighted move lists.
//! Lookup tolerates move-counter differences by trying keys of decreasing
//! specificity; selection is a weighted random draw with the personality's
//! signature continuation (the first-listed candidate) boosted by its
//! aggression factor.
//!
//! The selector is a pure suggestion source: it never checks legality.
//! The arbitrator pushes every suggestion through the shared application
//! path and downgrades an illegal entry to "no book move".

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

use super::personality::Personality;

/// One book candidate with its selection weight (weight > 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMove {
    /// Move in UCI coordinates
    pub mv: String,
    pub weight: f32,
}

impl WeightedMove {
    pub fn new(mv: &str, weight: f32) -> Self {
        Self {
            mv: mv.to_string(),
            weight,
        }
    }
}

/// Book moves for one position, split by side to move
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookEntry {
    #[serde(default)]
    pub white: Vec<WeightedMove>,
    #[serde(default)]
    pub black: Vec<WeightedMove>,
}

impl BookEntry {
    fn for_side(&self, side: Color) -> &[WeightedMove] {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Opening book: canonical position key -> entry
///
/// Keys are FEN prefixes. Authors may key at full 4-field specificity
/// (placement, side, castling, en passant), at 3 fields plus a `-`
/// wildcard, or at bare 3 fields; lookup walks that ladder from most to
/// least specific, so positions that differ only in move counters (or in
/// en-passant encoding conventions) still hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningBook {
    entries: HashMap<String, BookEntry>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, entry: BookEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the entry for a position, most specific key first
    pub fn lookup(&self, fen: &str) -> Option<&BookEntry> {
        position_keys(fen)
            .into_iter()
            .find_map(|key| self.entries.get(&key))
    }
}

/// Derive the lookup-key ladder for a position
///
/// Returns up to three keys in decreasing specificity. A FEN with fewer
/// than four fields contributes what it has.
pub fn position_keys(fen: &str) -> Vec<String> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let mut keys = Vec::with_capacity(3);
    if fields.len() >= 4 {
        keys.push(fields[..4].join(" "));
    }
    if fields.len() >= 3 {
        keys.push(format!("{} {} {} -", fields[0], fields[1], fields[2]));
        keys.push(fields[..3].join(" "));
    }
    keys.dedup();
    keys
}

/// Pick a book move for the side to move, or `None` when the book is
/// silent for this position
///
/// Weighted selection: the first-listed candidate's weight is multiplied
/// by `aggression_factor + 0.15`, all weights are summed, and a uniform
/// draw in `[0, total)` is consumed against the candidates in listed
/// order. Equal weights therefore tie-break toward the earlier-listed
/// (nominally main-line) move. Deterministic for a fixed `rng`.
pub fn select_book_move<R: Rng>(
    fen: &str,
    side: Color,
    personality: &Personality,
    rng: &mut R,
) -> Option<String> {
    let entry = personality.opening_book.lookup(fen)?;
    let candidates = entry.for_side(side);
    if candidates.is_empty() {
        return None;
    }

    let boost = personality.aggression_factor + 0.15;
    let weights: Vec<f32> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { c.weight * boost } else { c.weight })
        .collect();
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut draw = rng.random_range(0.0..total);
    for (candidate, weight) in candidates.iter().zip(&weights) {
        draw -= weight;
        if draw <= 0.0 {
            return Some(candidate.mv.clone());
        }
    }
    // float residue: the draw belongs to the last candidate
    candidates.last().map(|c| c.mv.clone())
}
