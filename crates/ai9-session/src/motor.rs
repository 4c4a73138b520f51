//! Motor addressing for `MOVE_MOTOR`.

use std::fmt;

/// Which motor group to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    /// Camera focus; left/right move along x, up/down along y.
    Focus,
}

/// Direction as seen on the splicer screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Left,
    Right,
    Up,
}

/// Default motor speed used by the device's own tooling.
pub const DEFAULT_SPEED: u8 = 9;

/// Map a side and direction to the device's `(motor, move)` pair.
pub fn motor_move(side: Side, direction: Direction) -> (u8, u8) {
    use Direction as D;

    match (side, direction) {
        (Side::Left, D::Down) => (2, 4),
        (Side::Left, D::Left) => (0, 2),
        (Side::Left, D::Right) => (0, 1),
        (Side::Left, D::Up) => (2, 3),
        (Side::Right, D::Down) => (3, 4),
        (Side::Right, D::Left) => (1, 1),
        (Side::Right, D::Right) => (1, 2),
        (Side::Right, D::Up) => (3, 3),
        (Side::Focus, D::Down) => (4, 2),
        (Side::Focus, D::Left) => (5, 2),
        (Side::Focus, D::Right) => (5, 1),
        (Side::Focus, D::Up) => (4, 1),
    }
}

/// `MOVE_MOTOR` body: `[motor, move, 0, steps, speed]`.
pub fn move_body(side: Side, direction: Direction, steps: u8, speed: u8) -> [u8; 5] {
    let (motor, movement) = motor_move(side, direction);
    [motor, movement, 0, steps, speed]
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Focus => "focus",
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_device() {
        assert_eq!(motor_move(Side::Left, Direction::Down), (2, 4));
        assert_eq!(motor_move(Side::Right, Direction::Left), (1, 1));
        assert_eq!(motor_move(Side::Focus, Direction::Up), (4, 1));
    }

    #[test]
    fn body_layout() {
        assert_eq!(
            move_body(Side::Right, Direction::Up, 100, DEFAULT_SPEED),
            [3, 3, 0, 100, 9]
        );
    }
}
