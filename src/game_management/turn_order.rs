//! Bid-order resolver
//!
//! Decides whose turn it is during bid collection. Seat order is the sole
//! ordering key: the seat list is rotated so the round's starter comes first,
//! then scanned for the first player who has not acted yet.
//!
//! Actual counts are deliberately not routed through this resolver: once
//! bidding closes they are simultaneous reveals and may arrive in any order.

use std::collections::HashSet;
use uuid::Uuid;

/// Next player to act, or `None` once every listed player has acted.
///
/// `seat_ordered` must be sorted by seat number. A starter that is no longer
/// in the list (removed mid-round) falls back to the seat-1 player.
pub fn next_to_act(
    seat_ordered: &[Uuid],
    starter: Uuid,
    acted: &HashSet<Uuid>,
) -> Option<Uuid> {
    let start = seat_ordered
        .iter()
        .position(|id| *id == starter)
        .unwrap_or(0);

    (0..seat_ordered.len())
        .map(|offset| seat_ordered[(start + offset) % seat_ordered.len()])
        .find(|id| !acted.contains(id))
}
