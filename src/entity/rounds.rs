use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rounds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub game_id: Uuid,
    pub round_number: i32,
    /// The player who bids first this round.
    pub starter_player_id: Uuid,
    pub status: RoundStatus,
    pub card_count: i32,
    pub trump_suit: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    #[sea_orm(string_value = "collecting_bids")]
    CollectingBids,
    #[sea_orm(string_value = "collecting_actuals")]
    CollectingActuals,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::games::Entity",
        from = "Column::GameId",
        to = "super::games::Column::Id"
    )]
    Game,
    #[sea_orm(has_many = "super::score_entries::Entity")]
    ScoreEntries,
}

impl Related<super::games::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl Related<super::score_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScoreEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
