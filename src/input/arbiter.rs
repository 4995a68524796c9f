//! Input Arbiter
//!
//! Picks the direction applied on a tick. Manual input beats the policy's
//! suggestion, which beats carrying on straight. A candidate that would
//! reverse the snake onto itself is dropped whichever source it came from.
//!
//! The reversal rule is about the direction applied on the previous tick.
//! Before a game's first step nothing has been applied yet, so
//! [`arbitrate_opening`] accepts any candidate and only uses the initial
//! heading as the fallback.

use crate::game::Direction;

/// Where the applied direction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionSource {
    Manual,
    Policy,
    Previous,
}

/// An arbitrated direction together with its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub direction: Direction,
    pub source: DirectionSource,
}

/// Resolve the effective direction and report which input won
pub fn arbitrate(
    previous: Direction,
    manual: Option<Direction>,
    suggestion: Option<Direction>,
) -> Resolution {
    pick(previous, manual, suggestion, |d| !previous.is_opposite(d))
}

/// Resolve the first direction of a game, when no step has been applied yet
pub fn arbitrate_opening(
    heading: Direction,
    manual: Option<Direction>,
    suggestion: Option<Direction>,
) -> Resolution {
    pick(heading, manual, suggestion, |_| true)
}

fn pick(
    previous: Direction,
    manual: Option<Direction>,
    suggestion: Option<Direction>,
    allowed: impl Fn(Direction) -> bool,
) -> Resolution {
    let admissible = |candidate: Option<Direction>| candidate.filter(|d| allowed(*d));

    if let Some(direction) = admissible(manual) {
        return Resolution {
            direction,
            source: DirectionSource::Manual,
        };
    }

    if let Some(direction) = admissible(suggestion) {
        return Resolution {
            direction,
            source: DirectionSource::Policy,
        };
    }

    Resolution {
        direction: previous,
        source: DirectionSource::Previous,
    }
}

/// Resolve the effective direction for a tick
pub fn resolve(
    previous: Direction,
    manual: Option<Direction>,
    suggestion: Option<Direction>,
) -> Direction {
    arbitrate(previous, manual, suggestion).direction
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn candidates() -> Vec<Option<Direction>> {
        std::iter::once(None).chain(ALL.into_iter().map(Some)).collect()
    }

    #[test]
    fn test_manual_wins() {
        let resolution = arbitrate(Direction::Down, Some(Direction::Left), Some(Direction::Right));
        assert_eq!(resolution.direction, Direction::Left);
        assert_eq!(resolution.source, DirectionSource::Manual);
    }

    #[test]
    fn test_policy_used_without_manual() {
        let resolution = arbitrate(Direction::Down, None, Some(Direction::Right));
        assert_eq!(resolution.direction, Direction::Right);
        assert_eq!(resolution.source, DirectionSource::Policy);
    }

    #[test]
    fn test_previous_kept_without_inputs() {
        let resolution = arbitrate(Direction::Left, None, None);
        assert_eq!(resolution.direction, Direction::Left);
        assert_eq!(resolution.source, DirectionSource::Previous);
    }

    #[test]
    fn test_reversing_manual_falls_through_to_policy() {
        let resolution = arbitrate(Direction::Down, Some(Direction::Up), Some(Direction::Left));
        assert_eq!(resolution.direction, Direction::Left);
        assert_eq!(resolution.source, DirectionSource::Policy);
    }

    #[test]
    fn test_reversing_policy_is_rejected() {
        let resolution = arbitrate(Direction::Right, None, Some(Direction::Left));
        assert_eq!(resolution.direction, Direction::Right);
        assert_eq!(resolution.source, DirectionSource::Previous);
    }

    #[test]
    fn test_opening_accepts_any_direction() {
        let resolution = arbitrate_opening(Direction::Down, Some(Direction::Up), None);
        assert_eq!(resolution.direction, Direction::Up);
        assert_eq!(resolution.source, DirectionSource::Manual);

        let resolution = arbitrate_opening(Direction::Down, None, Some(Direction::Up));
        assert_eq!(resolution.direction, Direction::Up);
        assert_eq!(resolution.source, DirectionSource::Policy);

        let resolution = arbitrate_opening(Direction::Down, None, None);
        assert_eq!(resolution.direction, Direction::Down);
        assert_eq!(resolution.source, DirectionSource::Previous);
    }

    #[test]
    fn test_reversal_rejected_once_moving() {
        assert_eq!(resolve(Direction::Down, Some(Direction::Up), None), Direction::Down);
        assert_eq!(resolve(Direction::Left, Some(Direction::Up), None), Direction::Up);
    }

    #[test]
    fn test_never_returns_opposite_of_previous() {
        for previous in ALL {
            for manual in candidates() {
                for suggestion in candidates() {
                    let direction = resolve(previous, manual, suggestion);
                    assert!(
                        !previous.is_opposite(direction),
                        "{previous:?} + {manual:?} / {suggestion:?} reversed to {direction:?}"
                    );
                }
            }
        }
    }
}
