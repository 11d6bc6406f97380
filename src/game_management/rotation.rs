//! Seat rotation policy
//!
//! After a round closes, seats shift one position backwards with wraparound:
//! the player second from the front takes seat 1, the front player wraps to
//! seat N. Dealing and starting responsibility thereby travel around the
//! table once per round.

/// New seat number for the player at 0-based `position` in current seat
/// order, at a table of `n` players.
pub fn rotated_seat(position: usize, n: usize) -> i32 {
    if n == 0 {
        return 1;
    }
    (((position + n - 1) % n) + 1) as i32
}

/// New seat numbers for all players, indexed by current seat position.
pub fn rotate_seats(n: usize) -> Vec<i32> {
    (0..n).map(|position| rotated_seat(position, n)).collect()
}
