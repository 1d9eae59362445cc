//! Phase-aware acceptance of captures, based on their exchange value.

use vpr_core::Position;

use crate::eval::material::lead;
use crate::eval::phase::GamePhase;

/// Lowest exchange value accepted in the opening.
const OPENING_MIN_SEE: i32 = -100;

/// Lowest exchange value accepted in an endgame by a side that is ahead.
const ENDGAME_AHEAD_MIN_SEE: i32 = -50;

/// Material lead above which an endgame side is willing to simplify.
const ENDGAME_AHEAD_MARGIN: i32 = 200;

/// Decides whether a capture counts as "good" for move ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradePolicy {
    phase: GamePhase,
    /// Material lead of the side to move, in centipawns.
    lead: i32,
}

impl TradePolicy {
    pub fn new(phase: GamePhase, lead: i32) -> Self {
        Self { phase, lead }
    }

    /// Policy for the side to move in `pos`.
    pub fn for_position(pos: &Position) -> Self {
        Self::new(GamePhase::detect(pos), lead(pos, pos.side_to_move()))
    }

    /// Whether a capture with exchange value `see` is acceptable.
    pub fn accepts(&self, see: i32) -> bool {
        let threshold = match self.phase {
            GamePhase::Opening => OPENING_MIN_SEE,
            GamePhase::Middlegame => 0,
            GamePhase::Endgame if self.lead > ENDGAME_AHEAD_MARGIN => ENDGAME_AHEAD_MIN_SEE,
            GamePhase::Endgame => 0,
        };
        see >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_tolerates_one_pawn() {
        let policy = TradePolicy::new(GamePhase::Opening, 0);
        assert!(policy.accepts(-100));
        assert!(!policy.accepts(-101));
    }

    #[test]
    fn middlegame_requires_even_trade() {
        let policy = TradePolicy::new(GamePhase::Middlegame, 900);
        assert!(policy.accepts(0));
        assert!(!policy.accepts(-1));
    }

    #[test]
    fn endgame_simplifies_only_when_ahead() {
        let ahead = TradePolicy::new(GamePhase::Endgame, 201);
        assert!(ahead.accepts(-50));
        assert!(!ahead.accepts(-51));

        let level = TradePolicy::new(GamePhase::Endgame, 200);
        assert!(!level.accepts(-50));
        assert!(level.accepts(0));
    }

    #[test]
    fn policy_reads_position() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 40").unwrap();
        assert_eq!(
            TradePolicy::for_position(&pos),
            TradePolicy::new(GamePhase::Endgame, -500)
        );
    }
}
