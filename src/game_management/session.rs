//! Game session controller
//!
//! Owns the game-level lifecycle (lobby, in progress, closed), the player
//! roster, and the read-side snapshot/leaderboard builders. Round-level
//! mutations are delegated to the round state machine.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::game_snapshot::{
    GameInfo, GameSnapshot, LeaderboardRow, PlayerSnapshot, RoundExtreme, RoundResult,
    RoundSnapshot, ScoreEntrySnapshot,
};
use crate::entity::{games, players, rounds, score_entries};
use crate::error::GameError;
use crate::game_management::round_flow::{self, lock_game, seat_ordered_players, touch_game};
use crate::game_management::rules;
use crate::game_management::turn_order::next_to_act;

/// Explicit handle on the one active game, injected as app data. Set when a
/// game is created or fully reset; never derived from a query at action time.
#[derive(Default)]
pub struct ActiveGame {
    id: RwLock<Option<Uuid>>,
}

impl ActiveGame {
    pub async fn get(&self) -> Option<Uuid> {
        *self.id.read().await
    }

    pub async fn set(&self, id: Option<Uuid>) {
        *self.id.write().await = id;
    }

    pub async fn require(&self) -> Result<Uuid, GameError> {
        self.get().await.ok_or(GameError::UnknownGame)
    }

    /// Return the active game id, running `create` if none is set. The write
    /// lock is held across creation so two concurrent first joins cannot
    /// each create a game.
    pub async fn get_or_create<F, Fut>(&self, create: F) -> Result<Uuid, GameError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Uuid, GameError>>,
    {
        let mut id = self.id.write().await;
        if let Some(existing) = *id {
            return Ok(existing);
        }
        let created = create().await?;
        *id = Some(created);
        Ok(created)
    }
}

/// Point the handle at the most recently created game, if any. Called once
/// at startup so an existing table survives a server restart.
pub async fn seed_active_game(
    db: &DatabaseConnection,
    active: &ActiveGame,
) -> Result<(), GameError> {
    let latest = games::Entity::find()
        .order_by_desc(games::Column::CreatedAt)
        .one(db)
        .await?;
    active.set(latest.map(|g| g.id)).await;
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeatDirection {
    Up,
    Down,
}

impl SeatDirection {
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        match raw {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(GameError::invalid_value(format!(
                "direction must be \"up\" or \"down\", got \"{other}\""
            ))),
        }
    }
}

/// Add a player to the active game, lazily creating a fresh game when none
/// exists. Latecomers may join mid-game; they land at the end of the seat
/// order with no retroactive scores.
pub async fn join(
    db: &DatabaseConnection,
    active: &ActiveGame,
    name: &str,
) -> Result<players::Model, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::invalid_value("player name must not be empty"));
    }

    let game_id = active
        .get_or_create(|| async {
            let game = create_game(db).await?;
            Ok(game.id)
        })
        .await?;

    let name = name.to_string();
    Ok(db
        .transaction(move |txn| Box::pin(join_txn(game_id, name, txn)))
        .await?)
}

async fn create_game(db: &DatabaseConnection) -> Result<games::Model, GameError> {
    let now: DateTime<FixedOffset> = Utc::now().into();
    let game = games::ActiveModel {
        id: Set(Uuid::new_v4()),
        status: Set(games::GameStatus::Lobby),
        round_counter: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(game.insert(db).await?)
}

async fn join_txn(
    game_id: Uuid,
    name: String,
    txn: &DatabaseTransaction,
) -> Result<players::Model, GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status == games::GameStatus::Closed {
        return Err(GameError::invalid_phase("game is closed"));
    }

    let roster = seat_ordered_players(game_id, txn).await?;
    let player = players::ActiveModel {
        id: Set(Uuid::new_v4()),
        game_id: Set(game_id),
        name: Set(name),
        seat_number: Set(roster.len() as i32 + 1),
        created_at: Set(Utc::now().into()),
    };
    let player = player.insert(txn).await?;
    touch_game(game, txn).await?;
    Ok(player)
}

/// Start the active game and create round 1.
pub async fn start(db: &DatabaseConnection, active: &ActiveGame) -> Result<rounds::Model, GameError> {
    let game_id = active.require().await?;
    Ok(db
        .transaction(move |txn| Box::pin(start_txn(game_id, txn)))
        .await?)
}

async fn start_txn(game_id: Uuid, txn: &DatabaseTransaction) -> Result<rounds::Model, GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status != games::GameStatus::Lobby {
        return Err(GameError::AlreadyStarted);
    }

    let roster = seat_ordered_players(game_id, txn).await?;
    if roster.is_empty() {
        return Err(GameError::NoPlayers);
    }

    // Preserved reference quirk: the completed-round counter doubles as a
    // rotating starter offset, so a game re-started after a keep-players
    // reset would not always open on seat 1. Fresh games (counter 0) do.
    let n = roster.len();
    let starter = roster[(game.round_counter as usize) % n].id;
    let round_number = game.round_counter + 1;

    let round = rounds::ActiveModel {
        id: Set(Uuid::new_v4()),
        game_id: Set(game_id),
        round_number: Set(round_number),
        starter_player_id: Set(starter),
        status: Set(rounds::RoundStatus::CollectingBids),
        card_count: Set(rules::card_count(round_number, n as i32)),
        trump_suit: Set(rules::random_trump()),
        created_at: Set(Utc::now().into()),
    };
    let round = round.insert(txn).await?;

    let mut game_update: games::ActiveModel = game.into();
    game_update.status = Set(games::GameStatus::InProgress);
    game_update.updated_at = Set(Utc::now().into());
    game_update.update(txn).await?;

    Ok(round)
}

/// Swap a player's seat with its immediate neighbor; no-op at the edges.
pub async fn reorder_seat(
    db: &DatabaseConnection,
    active: &ActiveGame,
    player_id: Uuid,
    direction: SeatDirection,
) -> Result<(), GameError> {
    let game_id = active.require().await?;
    Ok(db
        .transaction(move |txn| Box::pin(reorder_seat_txn(game_id, player_id, direction, txn)))
        .await?)
}

async fn reorder_seat_txn(
    game_id: Uuid,
    player_id: Uuid,
    direction: SeatDirection,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status == games::GameStatus::Closed {
        return Err(GameError::invalid_phase("game is closed"));
    }

    let roster = seat_ordered_players(game_id, txn).await?;
    let position = roster
        .iter()
        .position(|p| p.id == player_id)
        .ok_or(GameError::UnknownPlayer)?;

    let neighbor = match direction {
        SeatDirection::Up => position.checked_sub(1),
        SeatDirection::Down => (position + 1 < roster.len()).then_some(position + 1),
    };
    let Some(neighbor) = neighbor else {
        return Ok(());
    };

    let (a, b) = (roster[position].clone(), roster[neighbor].clone());
    let (seat_a, seat_b) = (a.seat_number, b.seat_number);

    let mut a_update: players::ActiveModel = a.into();
    a_update.seat_number = Set(seat_b);
    a_update.update(txn).await?;

    let mut b_update: players::ActiveModel = b.into();
    b_update.seat_number = Set(seat_a);
    b_update.update(txn).await?;

    touch_game(game, txn).await?;
    Ok(())
}

/// Remove a player; their score entries cascade away. Seats above the gap
/// shift down by one and nothing else is renumbered. A removal can complete
/// the phase everyone else was waiting on, so the round is re-checked.
pub async fn remove_player(
    db: &DatabaseConnection,
    active: &ActiveGame,
    player_id: Uuid,
) -> Result<(), GameError> {
    let game_id = active.require().await?;
    Ok(db
        .transaction(move |txn| Box::pin(remove_player_txn(game_id, player_id, txn)))
        .await?)
}

async fn remove_player_txn(
    game_id: Uuid,
    player_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status == games::GameStatus::Closed {
        return Err(GameError::invalid_phase("game is closed"));
    }

    let roster = seat_ordered_players(game_id, txn).await?;
    let target = roster
        .iter()
        .find(|p| p.id == player_id)
        .ok_or(GameError::UnknownPlayer)?
        .clone();

    players::Entity::delete_by_id(target.id).exec(txn).await?;

    for player in roster.iter().filter(|p| p.seat_number > target.seat_number) {
        let mut player_update: players::ActiveModel = player.clone().into();
        player_update.seat_number = Set(player.seat_number - 1);
        player_update.update(txn).await?;
    }

    touch_game(game.clone(), txn).await?;
    round_flow::settle_after_roster_change(game, txn).await
}

/// Close the active game. Idempotent; the game becomes read-only.
pub async fn close(db: &DatabaseConnection, active: &ActiveGame) -> Result<(), GameError> {
    let game_id = active.require().await?;
    Ok(db
        .transaction(move |txn| Box::pin(close_txn(game_id, txn)))
        .await?)
}

async fn close_txn(game_id: Uuid, txn: &DatabaseTransaction) -> Result<(), GameError> {
    let game = lock_game(game_id, txn).await?;
    if game.status == games::GameStatus::Closed {
        return Ok(());
    }
    let mut game_update: games::ActiveModel = game.into();
    game_update.status = Set(games::GameStatus::Closed);
    game_update.updated_at = Set(Utc::now().into());
    game_update.update(txn).await?;
    Ok(())
}

/// Wipe rounds and scores but keep the roster and seats; the game returns
/// to the lobby so it can be started again.
pub async fn reset_keeping_players(
    db: &DatabaseConnection,
    active: &ActiveGame,
) -> Result<(), GameError> {
    let game_id = active.require().await?;
    Ok(db
        .transaction(move |txn| Box::pin(reset_keeping_players_txn(game_id, txn)))
        .await?)
}

async fn reset_keeping_players_txn(
    game_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<(), GameError> {
    let game = lock_game(game_id, txn).await?;

    // Score entries cascade with their rounds
    rounds::Entity::delete_many()
        .filter(rounds::Column::GameId.eq(game_id))
        .exec(txn)
        .await?;

    let mut game_update: games::ActiveModel = game.into();
    game_update.status = Set(games::GameStatus::Lobby);
    game_update.round_counter = Set(0);
    game_update.updated_at = Set(Utc::now().into());
    game_update.update(txn).await?;
    Ok(())
}

/// Delete the game and everything it owns; the next `join` starts over.
pub async fn reset_full(db: &DatabaseConnection, active: &ActiveGame) -> Result<(), GameError> {
    let Some(game_id) = active.get().await else {
        return Ok(());
    };
    db.transaction(move |txn| {
        Box::pin(async move {
            lock_game(game_id, txn).await?;
            games::Entity::delete_by_id(game_id).exec(txn).await?;
            Ok::<(), GameError>(())
        })
    })
    .await?;
    active.set(None).await;
    Ok(())
}

/// Leaderboard ordering: cumulative points descending, ties broken by seat
/// order.
fn leaderboard_rows(
    roster: &[players::Model],
    entries: &[score_entries::Model],
) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = roster
        .iter()
        .map(|p| LeaderboardRow {
            player_id: p.id,
            name: p.name.clone(),
            seat_number: p.seat_number,
            total_points: entries
                .iter()
                .filter(|e| e.player_id == p.id)
                .filter_map(|e| e.points)
                .sum(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(a.seat_number.cmp(&b.seat_number))
    });
    rows
}

/// Build the read-side snapshot for the dashboard. Runs without the game
/// lock; a single SELECT per table gives a consistent-enough view for a
/// low-throughput scorekeeper.
pub async fn build_snapshot(
    db: &DatabaseConnection,
    active: &ActiveGame,
) -> Result<GameSnapshot, GameError> {
    let game_id = active.require().await?;
    let game = games::Entity::find_by_id(game_id)
        .one(db)
        .await?
        .ok_or(GameError::UnknownGame)?;

    let roster = seat_ordered_players(game_id, db).await?;
    let all_rounds = rounds::Entity::find()
        .filter(rounds::Column::GameId.eq(game_id))
        .order_by_asc(rounds::Column::RoundNumber)
        .all(db)
        .await?;

    let round_ids: Vec<Uuid> = all_rounds.iter().map(|r| r.id).collect();
    let all_entries = if round_ids.is_empty() {
        Vec::new()
    } else {
        score_entries::Entity::find()
            .filter(score_entries::Column::RoundId.is_in(round_ids))
            .all(db)
            .await?
    };

    let leaderboard = leaderboard_rows(&roster, &all_entries);
    let player_snapshots: Vec<PlayerSnapshot> = roster
        .iter()
        .map(|p| PlayerSnapshot {
            id: p.id,
            name: p.name.clone(),
            seat_number: p.seat_number,
            total_points: leaderboard
                .iter()
                .find(|row| row.player_id == p.id)
                .map(|row| row.total_points)
                .unwrap_or_default(),
        })
        .collect();

    let current = all_rounds.last().map(|round| {
        let entries: Vec<ScoreEntrySnapshot> = all_entries
            .iter()
            .filter(|e| e.round_id == round.id)
            .map(|e| ScoreEntrySnapshot {
                player_id: e.player_id,
                bid: e.bid,
                actual: e.actual,
                points: e.points,
            })
            .collect();

        let next_bidder_id = if round.status == rounds::RoundStatus::CollectingBids {
            let seat_ids: Vec<Uuid> = roster.iter().map(|p| p.id).collect();
            let acted = entries.iter().map(|e| e.player_id).collect();
            next_to_act(&seat_ids, round.starter_player_id, &acted)
        } else {
            None
        };
        let suggested_bid = next_bidder_id
            .map(|_| rules::suggested_bid(round.card_count, roster.len() as i32));

        RoundSnapshot {
            id: round.id,
            round_number: round.round_number,
            status: round.status,
            starter_player_id: round.starter_player_id,
            card_count: round.card_count,
            trump_suit: round.trump_suit.clone(),
            entries,
            next_bidder_id,
            suggested_bid,
        }
    });

    let last_closed_round = all_rounds
        .iter()
        .rev()
        .find(|r| r.status == rounds::RoundStatus::Closed)
        .map(|round| {
            let scored: Vec<(&score_entries::Model, i32)> = all_entries
                .iter()
                .filter(|e| e.round_id == round.id)
                .filter_map(|e| e.points.map(|points| (e, points)))
                .collect();
            let extreme = |entry: Option<&(&score_entries::Model, i32)>| {
                entry.and_then(|(e, points)| {
                    roster
                        .iter()
                        .find(|p| p.id == e.player_id)
                        .map(|p| RoundExtreme {
                            player_id: p.id,
                            name: p.name.clone(),
                            points: *points,
                        })
                })
            };
            RoundResult {
                round_number: round.round_number,
                best: extreme(scored.iter().max_by_key(|(_, points)| *points)),
                lowest: extreme(scored.iter().min_by_key(|(_, points)| *points)),
            }
        });

    Ok(GameSnapshot {
        game: GameInfo {
            id: game.id,
            status: game.status,
            rounds_completed: game.round_counter,
            created_at: game.created_at,
            updated_at: game.updated_at,
        },
        players: player_snapshots,
        current_round: current,
        leaderboard,
        last_closed_round,
    })
}

/// Leaderboard only, for the lightweight endpoint.
pub async fn leaderboard(
    db: &DatabaseConnection,
    active: &ActiveGame,
) -> Result<Vec<LeaderboardRow>, GameError> {
    let game_id = active.require().await?;
    let roster = seat_ordered_players(game_id, db).await?;
    let round_ids: Vec<Uuid> = rounds::Entity::find()
        .filter(rounds::Column::GameId.eq(game_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    let entries = if round_ids.is_empty() {
        Vec::new()
    } else {
        score_entries::Entity::find()
            .filter(score_entries::Column::RoundId.is_in(round_ids))
            .all(db)
            .await?
    };
    Ok(leaderboard_rows(&roster, &entries))
}
