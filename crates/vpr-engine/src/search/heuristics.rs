//! Killer moves and the history heuristic for quiet move ordering.

use vpr_core::Move;

use crate::search::negamax::MAX_PLY;

/// Two killer moves per ply: quiet moves that caused beta cutoffs there.
pub struct KillerTable {
    slots: [[Option<Move>; 2]; MAX_PLY],
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: [[None; 2]; MAX_PLY],
        }
    }

    /// Record a killer at `ply`, shifting the previous first slot down.
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(slots) = self.slots.get_mut(ply) else {
            return;
        };
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    pub fn is_killer(&self, ply: usize, mv: Move) -> bool {
        self.slots
            .get(ply)
            .is_some_and(|slots| slots.contains(&Some(mv)))
    }

    pub fn clear(&mut self) {
        self.slots = [[None; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum history score; keeps quiet moves below every other ordering band.
pub const HISTORY_MAX: i32 = 50_000;

/// History heuristic table, indexed by `[from][to]`.
pub struct HistoryTable {
    table: Box<[[i32; 64]; 64]>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            table: Box::new([[0; 64]; 64]),
        }
    }

    /// Reward a quiet move that caused a beta cutoff at `depth`.
    pub fn reward(&mut self, mv: Move, depth: i32) {
        let entry = &mut self.table[mv.get_source().to_index()][mv.get_dest().to_index()];
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    pub fn score(&self, mv: Move) -> i32 {
        self.table[mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    /// Halve every score so that recent cutoffs outweigh old ones.
    pub fn age(&mut self) {
        for row in self.table.iter_mut() {
            for entry in row.iter_mut() {
                *entry /= 2;
            }
        }
    }

    pub fn clear(&mut self) {
        self.table = Box::new([[0; 64]; 64]);
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use vpr_core::Square;

    fn mv(from: &str, to: &str) -> Move {
        Move::new(Square::from_str(from).unwrap(), Square::from_str(to).unwrap(), None)
    }

    #[test]
    fn killer_store_and_check() {
        let mut kt = KillerTable::new();
        let mv1 = mv("e2", "e4");
        let mv2 = mv("d2", "d4");

        kt.store(5, mv1);
        assert!(kt.is_killer(5, mv1));
        assert!(!kt.is_killer(5, mv2));

        kt.store(5, mv2);
        assert!(kt.is_killer(5, mv1));
        assert!(kt.is_killer(5, mv2));
    }

    #[test]
    fn killer_keeps_two_most_recent() {
        let mut kt = KillerTable::new();
        kt.store(0, mv("e2", "e4"));
        kt.store(0, mv("d2", "d4"));
        kt.store(0, mv("d2", "d4"));
        assert!(kt.is_killer(0, mv("e2", "e4")), "repeat store must not shift");

        kt.store(0, mv("c2", "c4"));
        assert!(!kt.is_killer(0, mv("e2", "e4")));
        assert!(kt.is_killer(0, mv("d2", "d4")));
        assert!(kt.is_killer(0, mv("c2", "c4")));
    }

    #[test]
    fn killer_plies_independent_and_bounded() {
        let mut kt = KillerTable::new();
        let e4 = mv("e2", "e4");
        kt.store(3, e4);
        assert!(!kt.is_killer(4, e4));
        kt.store(MAX_PLY + 5, e4);
        assert!(!kt.is_killer(MAX_PLY + 5, e4));
        kt.clear();
        assert!(!kt.is_killer(3, e4));
    }

    #[test]
    fn history_rewards_depth_squared() {
        let mut ht = HistoryTable::new();
        let nf3 = mv("g1", "f3");
        ht.reward(nf3, 4);
        ht.reward(nf3, 3);
        assert_eq!(ht.score(nf3), 25);
        assert_eq!(ht.score(mv("g1", "h3")), 0);
    }

    #[test]
    fn history_clamped_and_aged() {
        let mut ht = HistoryTable::new();
        let nf3 = mv("g1", "f3");
        for _ in 0..1_000 {
            ht.reward(nf3, 20);
        }
        assert_eq!(ht.score(nf3), HISTORY_MAX);
        ht.age();
        assert_eq!(ht.score(nf3), HISTORY_MAX / 2);
        ht.clear();
        assert_eq!(ht.score(nf3), 0);
    }
}
