//! Scoring module
//!
//! Pure point calculation for the Zouk card game. The round state machine
//! constrains the inputs (non-negative bids and actuals); nothing here can
//! fail.

/// Calculate points for one player's round from bid vs. actual tricks won.
///
/// - Zero bid that holds ("Zouk"): rewarded with the round number, so a
///   successful zero-bid is worth more the deeper into the game it happens.
/// - Zero bid that breaks: minus one point per unexpected trick.
/// - Exact non-zero bid: double the tricks won.
/// - Any other miss: minus the distance between bid and actual.
pub fn score(bid: i32, actual: i32, round_number: i32) -> i32 {
    if bid == 0 {
        if actual == 0 {
            round_number
        } else {
            -actual
        }
    } else if bid == actual {
        2 * actual
    } else {
        -(bid - actual).abs()
    }
}

/// Total score across rounds, from (bid, actual, round_number) triples.
pub fn total_from_rounds(round_data: &[(i32, i32, i32)]) -> i32 {
    round_data
        .iter()
        .map(|(bid, actual, round_number)| score(*bid, *actual, *round_number))
        .sum()
}
