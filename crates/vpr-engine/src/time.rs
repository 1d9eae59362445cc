//! Time management: convert clock parameters to a per-move budget.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::eval::phase::GamePhase;
use crate::search::control::SearchControl;

/// Shortest budget ever handed to the search.
const MIN_BUDGET: Duration = Duration::from_millis(10);

/// Fraction of the increment added to the base budget.
const INCREMENT_SHARE: f64 = 0.8;

/// Expected remaining moves for each phase.
fn divisor(phase: GamePhase) -> f64 {
    match phase {
        GamePhase::Opening => 50.0,
        GamePhase::Middlegame => 30.0,
        GamePhase::Endgame => 40.0,
    }
}

/// Spend less per move as the clock runs down.
fn pressure_scale(time_left: Duration) -> f64 {
    match time_left.as_secs() {
        s if s > 600 => 1.0,
        s if s > 60 => 0.8,
        _ => 0.6,
    }
}

/// Hard ceiling on a single move for the given clock.
fn ceiling(time_left: Duration) -> Duration {
    let secs = match time_left.as_secs() {
        s if s > 1_800 => 30,
        s if s > 600 => 20,
        s if s > 60 => 10,
        _ => 5,
    };
    Duration::from_secs(secs)
}

/// Compute the time budget for one move.
///
/// A zero `time_left` means the clock is not in use and returns `None`
/// (search until the depth limit or an external stop).
///
/// | Step       | Rule                                                  |
/// |------------|-------------------------------------------------------|
/// | Base       | `time_left / divisor` (Opening 50, Middlegame 30, Endgame 40) |
/// | Pressure   | ×1.0 above 10 min, ×0.8 above 1 min, ×0.6 below       |
/// | Increment  | `+ 0.8 × increment`                                   |
/// | Ceiling    | 30 / 20 / 10 / 5 s above 30 min / 10 min / 1 min / below |
/// | Clamp      | at least 10 ms, then at most half the clock           |
pub fn allocate(time_left: Duration, increment: Duration, phase: GamePhase) -> Option<Duration> {
    if time_left.is_zero() {
        return None;
    }

    let base_ms = time_left.as_millis() as f64 / divisor(phase) * pressure_scale(time_left);
    let budget_ms = base_ms + increment.as_millis() as f64 * INCREMENT_SHARE;

    let budget = Duration::from_millis(budget_ms.round() as u64)
        .min(ceiling(time_left))
        .max(MIN_BUDGET)
        .min(time_left / 2);

    Some(budget)
}

/// Clock parameters of one search, already resolved for the side to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    /// Remaining time on the mover's clock; `None` or zero when untimed.
    pub time_left: Option<Duration>,
    pub increment: Duration,
    /// Exact time to spend on this move.
    pub movetime: Option<Duration>,
    pub infinite: bool,
}

/// Build a [`SearchControl`] for one search.
///
/// Priority order:
/// 1. `infinite`, or a fixed depth: no time limit
/// 2. `movetime`: exactly that budget
/// 3. `time_left`: [`allocate`] for the current phase
/// 4. nothing given: no time limit
pub fn control_for(
    clock: &Clock,
    fixed_depth: bool,
    phase: GamePhase,
    stopped: Arc<AtomicBool>,
) -> SearchControl {
    if clock.infinite || fixed_depth {
        return SearchControl::new_infinite(stopped);
    }
    if let Some(movetime) = clock.movetime {
        return SearchControl::new_timed(stopped, movetime);
    }
    let limit = clock
        .time_left
        .and_then(|left| allocate(left, clock.increment, phase));
    SearchControl::new(stopped, limit)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn zero_clock_is_unlimited() {
        assert_eq!(allocate(Duration::ZERO, secs(5), GamePhase::Middlegame), None);
    }

    #[test]
    fn long_opening_clock_is_capped() {
        let budget = allocate(secs(1_800), Duration::ZERO, GamePhase::Opening).unwrap();
        assert!(budget < secs(60));
        // 1800 / 50 = 36 s, capped at 20 s for a clock of exactly 30 min.
        assert_eq!(budget, secs(20));
    }

    #[test]
    fn middlegame_uses_smaller_divisor() {
        let opening = allocate(secs(300), Duration::ZERO, GamePhase::Opening).unwrap();
        let middle = allocate(secs(300), Duration::ZERO, GamePhase::Middlegame).unwrap();
        let endgame = allocate(secs(300), Duration::ZERO, GamePhase::Endgame).unwrap();
        assert!(middle > endgame && endgame > opening);
        // 300 / 30 × 0.8 = 8 s.
        assert_eq!(middle, secs(8));
    }

    #[test]
    fn increment_adds_eighty_percent() {
        let without = allocate(secs(300), Duration::ZERO, GamePhase::Middlegame).unwrap();
        let with = allocate(secs(300), secs(1), GamePhase::Middlegame).unwrap();
        assert_eq!(with - without, Duration::from_millis(800));
    }

    #[test]
    fn low_clock_is_scaled_and_capped() {
        // 30 / 40 × 0.6 = 0.45 s.
        let budget = allocate(secs(30), Duration::ZERO, GamePhase::Endgame).unwrap();
        assert_eq!(budget, Duration::from_millis(450));

        let budget = allocate(secs(59), secs(30), GamePhase::Endgame).unwrap();
        assert_eq!(budget, secs(5));
    }

    #[test]
    fn never_more_than_half_the_clock() {
        let budget = allocate(Duration::from_millis(100), secs(10), GamePhase::Middlegame).unwrap();
        assert_eq!(budget, Duration::from_millis(50));
    }

    #[test]
    fn control_prefers_fixed_depth_over_clock() {
        let clock = Clock {
            time_left: Some(secs(60)),
            ..Clock::default()
        };
        let flag = Arc::new(AtomicBool::new(false));
        let control = control_for(&clock, true, GamePhase::Middlegame, Arc::clone(&flag));
        assert_eq!(control.limit(), None);
        let control = control_for(&clock, false, GamePhase::Middlegame, flag);
        assert!(control.limit().is_some());
    }

    #[test]
    fn control_uses_movetime_verbatim() {
        let clock = Clock {
            time_left: Some(secs(60)),
            movetime: Some(Duration::from_millis(250)),
            ..Clock::default()
        };
        let control = control_for(&clock, false, GamePhase::Opening, Arc::new(AtomicBool::new(false)));
        assert_eq!(control.limit(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn control_without_clock_is_unlimited() {
        let flag = Arc::new(AtomicBool::new(false));
        let untimed = control_for(&Clock::default(), false, GamePhase::Opening, Arc::clone(&flag));
        assert_eq!(untimed.limit(), None);
        let zero = Clock {
            time_left: Some(Duration::ZERO),
            ..Clock::default()
        };
        assert_eq!(control_for(&zero, false, GamePhase::Opening, flag).limit(), None);
    }

    #[test]
    fn at_least_ten_milliseconds() {
        let budget = allocate(Duration::from_millis(400), Duration::ZERO, GamePhase::Opening).unwrap();
        assert_eq!(budget, MIN_BUDGET);
    }

    #[test]
    fn nearly_flagged_clock_never_exceeds_half() {
        for ms in [1, 4, 19] {
            let left = Duration::from_millis(ms);
            let budget = allocate(left, Duration::from_secs(2), GamePhase::Endgame).unwrap();
            assert!(budget <= left / 2, "{budget:?} for {left:?}");
        }
    }
}
