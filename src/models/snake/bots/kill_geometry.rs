//! Where an opposing head has to be for an enemy snake to try cutting it off.
//!
//! Offsets and maneuvers are written for a snake facing [`Direction::Up`] and rotated
//! into the snake's real heading with [`Direction::rotated_by`] / [`rotate_offset`].
use std::collections::HashSet;

use crate::models::snake::{
    grid::Grid,
    snake_game::Direction,
    tile::Position,
};

/// A detected opponent position together with the moves that would cut it off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KillPattern {
    /// `(lateral, forward)` from our head. Negative lateral is to our left.
    pub offset: (isize, isize),
    pub first: Direction,
    /// Owed on the following tick, for two-move maneuvers.
    pub second: Option<Direction>,
}

/// Checked in order, the first match wins. A match at index `i` is kill state `i + 1`.
/// Second legs are rotated by the heading at detection, not the heading after the first leg.
pub const KILL_PATTERNS: [KillPattern; 6] = [
    KillPattern {
        offset: (-2, 0),
        first: Direction::Up,
        second: Some(Direction::Left),
    },
    KillPattern {
        offset: (-2, -2),
        first: Direction::Left,
        second: None,
    },
    KillPattern {
        offset: (-2, -3),
        first: Direction::Left,
        second: Some(Direction::Left),
    },
    KillPattern {
        offset: (2, 0),
        first: Direction::Up,
        second: Some(Direction::Right),
    },
    KillPattern {
        offset: (2, -2),
        first: Direction::Right,
        second: None,
    },
    KillPattern {
        offset: (2, -3),
        first: Direction::Right,
        second: Some(Direction::Right),
    },
];

/// Rotates an up-frame `(lateral, forward)` offset into a board `(dx, dy)` for `facing`.
#[must_use]
pub fn rotate_offset(offset: (isize, isize), facing: Direction) -> (isize, isize) {
    let (mut x, mut y) = offset;
    for _ in 0..facing.index() {
        (x, y) = (y, -x);
    }
    (x, y)
}

/// A kill pattern already turned into board directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KillPlan {
    /// 1 through 6, for logging.
    pub state: usize,
    pub first: Direction,
    pub second: Option<Direction>,
}

/// Looks for another snake's head at one of the [`KILL_PATTERNS`] offsets.
#[must_use]
pub fn detect_kill(
    grid: &Grid,
    head: Position,
    facing: Direction,
    other_heads: &HashSet<Position>,
) -> Option<KillPlan> {
    let hx = isize::try_from(head.0).ok()?;
    let hy = isize::try_from(head.1).ok()?;
    KILL_PATTERNS.iter().enumerate().find_map(|(i, pattern)| {
        let (dx, dy) = rotate_offset(pattern.offset, facing);
        let target = grid.checked_position(hx + dx, hy + dy)?;
        if target == head || !other_heads.contains(&target) {
            return None;
        }
        Some(KillPlan {
            state: i + 1,
            first: pattern.first.rotated_by(facing),
            second: pattern.second.map(|d| d.rotated_by(facing)),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_follows_heading() {
        // one to the left
        assert_eq!(rotate_offset((-1, 0), Direction::Up), (-1, 0));
        assert_eq!(rotate_offset((-1, 0), Direction::Right), (0, 1));
        assert_eq!(rotate_offset((-1, 0), Direction::Down), (1, 0));
        assert_eq!(rotate_offset((-1, 0), Direction::Left), (0, -1));
        // straight ahead matches the heading's own delta
        for facing in Direction::VARIANTS {
            assert_eq!(rotate_offset((0, 1), facing), facing.delta());
        }
    }

    #[test]
    fn rotated_maneuvers_agree_with_rotated_offsets() {
        for facing in Direction::VARIANTS {
            assert_eq!(Direction::Left.rotated_by(facing).delta(), rotate_offset((-1, 0), facing));
            assert_eq!(Direction::Right.rotated_by(facing).delta(), rotate_offset((1, 0), facing));
        }
    }

    #[test]
    fn finds_head_two_to_the_left() {
        let grid = Grid::new(10, 10);
        let heads = HashSet::from([(3, 5)]);
        let plan = detect_kill(&grid, (5, 5), Direction::Up, &heads).unwrap();
        assert_eq!(plan.state, 1);
        assert_eq!(plan.first, Direction::Up);
        assert_eq!(plan.second, Some(Direction::Left));
    }

    #[test]
    fn finds_mirrored_head_when_facing_down() {
        let grid = Grid::new(10, 10);
        // facing down, our right is the board's left; two right and three back is (3, 8)
        let heads = HashSet::from([(3, 8)]);
        let plan = detect_kill(&grid, (5, 5), Direction::Down, &heads).unwrap();
        assert_eq!(plan.state, 6);
        assert_eq!(plan.first, Direction::Left);
        assert_eq!(plan.second, Some(Direction::Left));
    }

    #[test]
    fn single_move_pattern_has_no_second_leg() {
        let grid = Grid::new(10, 10);
        // facing right, our left is up; two left and two back is (3, 7)
        let heads = HashSet::from([(3, 7)]);
        let plan = detect_kill(&grid, (5, 5), Direction::Right, &heads).unwrap();
        assert_eq!(plan.state, 2);
        assert_eq!(plan.first, Direction::Up);
        assert_eq!(plan.second, None);
    }

    #[test]
    fn ignores_heads_elsewhere_and_off_grid_offsets() {
        let grid = Grid::new(10, 10);
        let heads = HashSet::from([(5, 6), (9, 9)]);
        assert!(detect_kill(&grid, (5, 5), Direction::Up, &heads).is_none());
        assert!(detect_kill(&grid, (0, 0), Direction::Up, &HashSet::new()).is_none());
    }
}
