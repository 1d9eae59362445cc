//! Transposition table.
//!
//! A fixed-capacity table of 4-slot buckets indexed by the low bits of the
//! Zobrist key. The full key is stored in each slot, so a hit is only
//! reported for the exact position that was stored.
//!
//! ## Replacement
//!
//! 1. A slot already holding the same key is always overwritten.
//! 2. Otherwise an empty slot is used.
//! 3. Otherwise the shallowest slot older than `generation - 2` is evicted.
//! 4. Otherwise the shallowest slot in the bucket is evicted.

use vpr_core::Move;

use crate::eval::MATE_VALUE;

/// Slots per bucket.
const BUCKET_SIZE: usize = 4;

/// Entries older than this many generations are evicted first.
const STALE_AGE: u8 = 2;

/// Scores beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_VALUE - 1_000;

/// Bound type stored with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The value is exact (it fell strictly inside the window).
    Exact,
    /// The value is a lower bound (the node failed high).
    LowerBound,
    /// The value is an upper bound (no move raised alpha).
    UpperBound,
}

/// Result of a probe.
///
/// `value` is present only when the stored entry is deep enough and its bound
/// settles the current window; `best_move` is surfaced on any key match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TtProbe {
    pub value: Option<i32>,
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: u64,
    depth: i16,
    value: i32,
    bound: Bound,
    best_move: Option<Move>,
    generation: u8,
}

/// Convert a search score to table form.
///
/// Mate scores depend on the distance from the root; they are stored as
/// distance from the node so they stay valid when reached by another path.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Reverse [`score_to_tt`] for a node `ply` plies below the root.
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

/// Fixed-size cache of search results keyed by Zobrist hash.
pub struct TranspositionTable {
    slots: Vec<Option<Entry>>,
    /// `bucket_count - 1` (power-of-two allocation).
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Create a table using roughly `mb` megabytes.
    ///
    /// The bucket count is rounded down to a power of two (at least one).
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let bucket_bytes = BUCKET_SIZE * std::mem::size_of::<Option<Entry>>();
        let buckets = (bytes / bucket_bytes).max(1);
        let buckets = if buckets.is_power_of_two() {
            buckets
        } else {
            buckets.next_power_of_two() >> 1
        };

        Self {
            slots: vec![None; buckets * BUCKET_SIZE],
            mask: buckets - 1,
            generation: 0,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every entry and reset the generation counter.
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.generation = 0;
    }

    /// Reallocate to roughly `mb` megabytes, dropping every entry.
    pub fn resize(&mut self, mb: usize) {
        *self = Self::new(mb);
    }

    /// Advance the generation. Call once per top-level search.
    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    fn bucket(&self, key: u64) -> std::ops::Range<usize> {
        let start = (key as usize & self.mask) * BUCKET_SIZE;
        start..start + BUCKET_SIZE
    }

    fn find(&self, key: u64) -> Option<&Entry> {
        self.slots[self.bucket(key)]
            .iter()
            .flatten()
            .find(|entry| entry.key == key)
    }

    /// Look up `key` for a node searched to `depth` with window `[alpha, beta]`.
    ///
    /// The value is usable when the stored depth is at least `depth` and
    /// - the bound is exact, or
    /// - it is a lower bound at or above `beta`, or
    /// - it is an upper bound at or below `alpha`.
    pub fn probe(&self, key: u64, depth: i32, alpha: i32, beta: i32, ply: usize) -> TtProbe {
        let Some(entry) = self.find(key) else {
            return TtProbe::default();
        };

        let value = score_from_tt(entry.value, ply);
        let usable = i32::from(entry.depth) >= depth
            && match entry.bound {
                Bound::Exact => true,
                Bound::LowerBound => value >= beta,
                Bound::UpperBound => value <= alpha,
            };

        TtProbe {
            value: usable.then_some(value),
            best_move: entry.best_move,
        }
    }

    /// Stored best move for `key`, if any.
    pub fn best_move(&self, key: u64) -> Option<Move> {
        self.find(key).and_then(|entry| entry.best_move)
    }

    /// Record a search result.
    ///
    /// When `best_move` is `None` and the key was already present, the
    /// previous move is kept as an ordering hint.
    pub fn store(
        &mut self,
        key: u64,
        depth: i32,
        value: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: usize,
    ) {
        let range = self.bucket(key);
        let generation = self.generation;

        let index = self.slot_for(key, range);
        let previous_move = self.slots[index]
            .filter(|entry| entry.key == key)
            .and_then(|entry| entry.best_move);

        self.slots[index] = Some(Entry {
            key,
            depth: depth.clamp(0, i16::MAX as i32) as i16,
            value: score_to_tt(value, ply),
            bound,
            best_move: best_move.or(previous_move),
            generation,
        });
    }

    /// Pick the slot in `range` that a new entry for `key` should occupy.
    fn slot_for(&self, key: u64, range: std::ops::Range<usize>) -> usize {
        let bucket = &self.slots[range.clone()];

        if let Some(i) = bucket.iter().position(|s| s.is_some_and(|e| e.key == key)) {
            return range.start + i;
        }
        if let Some(i) = bucket.iter().position(Option::is_none) {
            return range.start + i;
        }

        let shallowest = |stale_only: bool| {
            bucket
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.map(|entry| (i, entry)))
                .filter(|(_, entry)| {
                    !stale_only || self.generation.wrapping_sub(entry.generation) > STALE_AGE
                })
                .min_by_key(|(_, entry)| entry.depth)
                .map(|(i, _)| i)
        };

        range.start + shallowest(true).or_else(|| shallowest(false)).unwrap_or(0)
    }

    /// Per-mille of sampled slots written during the current generation.
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1_000);
        let used = self.slots[..sample]
            .iter()
            .flatten()
            .filter(|entry| entry.generation == self.generation)
            .count();
        (used * 1_000 / sample.max(1)) as u32
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.slots.len())
            .field("generation", &self.generation)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
