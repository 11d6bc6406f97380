use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::games::GameStatus;
use crate::entity::rounds::RoundStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game: GameInfo,
    pub players: Vec<PlayerSnapshot>,
    pub current_round: Option<RoundSnapshot>,
    pub leaderboard: Vec<LeaderboardRow>,
    /// Best and worst scorer of the most recently closed round, if any.
    pub last_closed_round: Option<RoundResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: Uuid,
    pub status: GameStatus,
    pub rounds_completed: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub seat_number: i32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub id: Uuid,
    pub round_number: i32,
    pub status: RoundStatus,
    pub starter_player_id: Uuid,
    pub card_count: i32,
    pub trump_suit: String,
    pub entries: Vec<ScoreEntrySnapshot>,
    /// Whose turn it is to bid; `None` outside the bidding phase or once all bids are in.
    pub next_bidder_id: Option<Uuid>,
    /// Advisory hint for the player on turn; not part of the scoring contract.
    pub suggested_bid: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntrySnapshot {
    pub player_id: Uuid,
    pub bid: i32,
    pub actual: Option<i32>,
    pub points: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub player_id: Uuid,
    pub name: String,
    pub seat_number: i32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: i32,
    pub best: Option<RoundExtreme>,
    pub lowest: Option<RoundExtreme>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundExtreme {
    pub player_id: Uuid,
    pub name: String,
    pub points: i32,
}
