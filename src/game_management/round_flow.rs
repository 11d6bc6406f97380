//! Round state machine
//!
//! Owns the lifecycle of a single round: collecting bids, collecting actual
//! trick counts, and closing the round (which rotates seats and spawns the
//! successor round in the same transaction).
//!
//! Every mutation here runs inside a transaction holding a `FOR UPDATE` lock
//! on the game row, so two near-simultaneous submissions cannot both observe
//! "not yet complete" and double-close a round.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::{games, players, rounds, score_entries};
use crate::error::GameError;
use crate::game_management::rotation::rotated_seat;
use crate::game_management::rules;
use crate::game_management::scoring::score;
use crate::game_management::turn_order::next_to_act;

/// Fetch the game row under a `FOR UPDATE` lock. All state-mutating
/// operations go through this first.
pub(crate) async fn lock_game(
    game_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<games::Model, GameError> {
    games::Entity::find_by_id(game_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(GameError::UnknownGame)
}

/// The current round is always the one with the highest round number.
pub(crate) async fn current_round<C: ConnectionTrait>(
    game_id: Uuid,
    conn: &C,
) -> Result<rounds::Model, GameError> {
    rounds::Entity::find()
        .filter(rounds::Column::GameId.eq(game_id))
        .order_by_desc(rounds::Column::RoundNumber)
        .one(conn)
        .await?
        .ok_or(GameError::UnknownRound)
}

pub(crate) async fn seat_ordered_players<C: ConnectionTrait>(
    game_id: Uuid,
    conn: &C,
) -> Result<Vec<players::Model>, GameError> {
    Ok(players::Entity::find()
        .filter(players::Column::GameId.eq(game_id))
        .order_by_asc(players::Column::SeatNumber)
        .all(conn)
        .await?)
}

pub(crate) async fn entries_for_round<C: ConnectionTrait>(
    round_id: Uuid,
    conn: &C,
) -> Result<Vec<score_entries::Model>, GameError> {
    Ok(score_entries::Entity::find()
        .filter(score_entries::Column::RoundId.eq(round_id))
        .all(conn)
        .await?)
}

pub(crate) async fn touch_game(
    game: games::Model,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    let mut game_update: games::ActiveModel = game.into();
    game_update.updated_at = Set(Utc::now().into());
    game_update.update(txn).await?;
    Ok(())
}

/// Record a player's bid for the current round.
///
/// Bids are strictly turn-ordered: the bid-order resolver must name this
/// player next. The last bid in flips the round to `collecting_actuals`
/// immediately; there is no host confirmation step.
pub(crate) async fn record_bid_txn(
    game_id: Uuid,
    player_id: Uuid,
    bid: i32,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status != games::GameStatus::InProgress {
        return Err(GameError::invalid_phase("game is not in progress"));
    }

    let round = current_round(game_id, txn).await?;
    if round.status != rounds::RoundStatus::CollectingBids {
        return Err(GameError::invalid_phase("round is not collecting bids"));
    }

    let roster = seat_ordered_players(game_id, txn).await?;
    if !roster.iter().any(|p| p.id == player_id) {
        return Err(GameError::UnknownPlayer);
    }

    let entries = entries_for_round(round.id, txn).await?;
    if entries.iter().any(|e| e.player_id == player_id) {
        return Err(GameError::AlreadyRecorded);
    }

    let seat_ids: Vec<Uuid> = roster.iter().map(|p| p.id).collect();
    let acted: HashSet<Uuid> = entries.iter().map(|e| e.player_id).collect();
    if next_to_act(&seat_ids, round.starter_player_id, &acted) != Some(player_id) {
        return Err(GameError::OutOfTurn);
    }

    let entry = score_entries::ActiveModel {
        id: Set(Uuid::new_v4()),
        round_id: Set(round.id),
        player_id: Set(player_id),
        bid: Set(bid),
        actual: Set(None),
        points: Set(None),
    };
    entry.insert(txn).await?;

    // Recount against the live roster, not the entry count: a player removed
    // mid-round may have left an orphaned phase.
    let mut bid_in = acted;
    bid_in.insert(player_id);
    if roster.iter().all(|p| bid_in.contains(&p.id)) {
        let mut round_update: rounds::ActiveModel = round.into();
        round_update.status = Set(rounds::RoundStatus::CollectingActuals);
        round_update.update(txn).await?;
    }

    touch_game(game, txn).await?;
    Ok(())
}

/// Record a player's actual trick count and derived points.
///
/// Actuals may arrive in any order once bidding has closed. Returns `true`
/// when this submission completed and closed the round.
pub(crate) async fn record_actual_txn(
    game_id: Uuid,
    player_id: Uuid,
    actual: i32,
    txn: &DatabaseTransaction,
) -> Result<bool, GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status != games::GameStatus::InProgress {
        return Err(GameError::invalid_phase("game is not in progress"));
    }

    let round = current_round(game_id, txn).await?;
    if round.status != rounds::RoundStatus::CollectingActuals {
        return Err(GameError::invalid_phase("round is not collecting actuals"));
    }

    let entries = entries_for_round(round.id, txn).await?;
    let entry = entries
        .iter()
        .find(|e| e.player_id == player_id)
        .ok_or(GameError::UnknownPlayer)?;
    if entry.actual.is_some() {
        return Err(GameError::AlreadyRecorded);
    }

    let points = score(entry.bid, actual, round.round_number);
    let mut entry_update: score_entries::ActiveModel = entry.clone().into();
    entry_update.actual = Set(Some(actual));
    entry_update.points = Set(Some(points));
    entry_update.update(txn).await?;

    close_if_complete(game, round, txn).await
}

/// Close the round once every recorded bid has a matching actual: rotate
/// seats, bump the game's completed-round counter, and spawn the successor
/// round atomically.
///
/// Completeness is judged over the round's entries, not the live roster. A
/// latecomer who joined after bidding closed has no entry and owes nothing
/// this round; entries of removed players cascade away. Neither a join nor
/// a removal can leave the check waiting on an actual that can never come.
pub(crate) async fn close_if_complete(
    game: games::Model,
    round: rounds::Model,
    txn: &DatabaseTransaction,
) -> Result<bool, GameError> {
    let roster = seat_ordered_players(game.id, txn).await?;
    if roster.is_empty() {
        return Ok(false);
    }

    let entries = entries_for_round(round.id, txn).await?;
    if !entries.iter().all(|e| e.actual.is_some()) {
        return Ok(false);
    }

    let next_number = round.round_number + 1;
    let mut round_update: rounds::ActiveModel = round.into();
    round_update.status = Set(rounds::RoundStatus::Closed);
    round_update.update(txn).await?;

    // Left-rotation: the player who was second now holds seat 1 and starts
    // the next round. With a single player this is a no-op.
    let n = roster.len();
    for (position, player) in roster.iter().enumerate() {
        let mut player_update: players::ActiveModel = player.clone().into();
        player_update.seat_number = Set(rotated_seat(position, n));
        player_update.update(txn).await?;
    }
    let starter = roster[if n > 1 { 1 } else { 0 }].id;

    let next_round = rounds::ActiveModel {
        id: Set(Uuid::new_v4()),
        game_id: Set(game.id),
        round_number: Set(next_number),
        starter_player_id: Set(starter),
        status: Set(rounds::RoundStatus::CollectingBids),
        card_count: Set(rules::card_count(next_number, n as i32)),
        trump_suit: Set(rules::random_trump()),
        created_at: Set(Utc::now().into()),
    };
    next_round.insert(txn).await?;

    let rounds_completed = game.round_counter + 1;
    let mut game_update: games::ActiveModel = game.into();
    game_update.round_counter = Set(rounds_completed);
    game_update.updated_at = Set(Utc::now().into());
    game_update.update(txn).await?;

    Ok(true)
}

/// Re-check the current round after a roster change. Removing the one player
/// everyone was waiting on must be able to complete the phase.
pub(crate) async fn settle_after_roster_change(
    game: games::Model,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    if game.status != games::GameStatus::InProgress {
        return Ok(());
    }
    let round = match current_round(game.id, txn).await {
        Ok(round) => round,
        Err(GameError::UnknownRound) => return Ok(()),
        Err(err) => return Err(err),
    };

    match round.status {
        rounds::RoundStatus::CollectingBids => {
            let roster = seat_ordered_players(game.id, txn).await?;
            if roster.is_empty() {
                return Ok(());
            }
            let entries = entries_for_round(round.id, txn).await?;
            if roster
                .iter()
                .all(|p| entries.iter().any(|e| e.player_id == p.id))
            {
                let mut round_update: rounds::ActiveModel = round.into();
                round_update.status = Set(rounds::RoundStatus::CollectingActuals);
                round_update.update(txn).await?;
            }
            Ok(())
        }
        rounds::RoundStatus::CollectingActuals => {
            close_if_complete(game, round, txn).await?;
            Ok(())
        }
        rounds::RoundStatus::Closed => Ok(()),
    }
}
