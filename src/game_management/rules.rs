//! Round dressing rules
//!
//! Card counts, trump suits and the advisory bid hint. None of this feeds
//! the scoring engine; it exists so the table knows how many cards to deal
//! and which suit is trump each round.

use rand::seq::SliceRandom;

/// Cards in a standard deck.
pub const DECK_SIZE: i32 = 52;

/// Trump suits as stored on a round.
pub const TRUMP_SUITS: [&str; 4] = ["spades", "hearts", "diamonds", "clubs"];

/// Cards dealt per player this round: the round number, capped so the deck
/// covers the whole table, never below 1.
pub fn card_count(round_number: i32, player_count: i32) -> i32 {
    if player_count <= 0 {
        return 1;
    }
    round_number.clamp(1, (DECK_SIZE / player_count).max(1))
}

/// Draw a trump suit for a new round.
pub fn random_trump() -> String {
    let mut rng = rand::thread_rng();
    TRUMP_SUITS
        .choose(&mut rng)
        .copied()
        .unwrap_or("spades")
        .to_string()
}

/// Advisory bid hint: an even share of the round's tricks. Purely a
/// suggestion surfaced to the player on turn.
pub fn suggested_bid(card_count: i32, player_count: i32) -> i32 {
    if player_count <= 0 {
        0
    } else {
        card_count / player_count
    }
}
