use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create games table
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Games::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Games::RoundCounter).integer().not_null().default(0))
                    .col(ColumnDef::new(Games::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Games::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create players table
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::GameId).uuid().not_null())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(ColumnDef::new(Players::SeatNumber).integer().not_null())
                    .col(ColumnDef::new(Players::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_players_game_id")
                            .from(Players::Table, Players::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create rounds table
        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rounds::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rounds::GameId).uuid().not_null())
                    .col(ColumnDef::new(Rounds::RoundNumber).integer().not_null())
                    .col(ColumnDef::new(Rounds::StarterPlayerId).uuid().not_null())
                    .col(ColumnDef::new(Rounds::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Rounds::CardCount).integer().not_null())
                    .col(ColumnDef::new(Rounds::TrumpSuit).string_len(10).not_null())
                    .col(ColumnDef::new(Rounds::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_game_id")
                            .from(Rounds::Table, Rounds::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create score_entries table
        manager
            .create_table(
                Table::create()
                    .table(ScoreEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScoreEntries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScoreEntries::RoundId).uuid().not_null())
                    .col(ColumnDef::new(ScoreEntries::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(ScoreEntries::Bid).integer().not_null())
                    .col(ColumnDef::new(ScoreEntries::Actual).integer().null())
                    .col(ColumnDef::new(ScoreEntries::Points).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_score_entries_round_id")
                            .from(ScoreEntries::Table, ScoreEntries::RoundId)
                            .to(Rounds::Table, Rounds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_score_entries_player_id")
                            .from(ScoreEntries::Table, ScoreEntries::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One entry per player per round
        manager
            .create_index(
                Index::create()
                    .name("idx_score_entries_round_player")
                    .table(ScoreEntries::Table)
                    .col(ScoreEntries::RoundId)
                    .col(ScoreEntries::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_players_game_id")
                    .table(Players::Table)
                    .col(Players::GameId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(ScoreEntries::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Rounds::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Games {
    Table,
    Id,
    Status,
    RoundCounter,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    GameId,
    Name,
    SeatNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Rounds {
    Table,
    Id,
    GameId,
    RoundNumber,
    StarterPlayerId,
    Status,
    CardCount,
    TrumpSuit,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScoreEntries {
    Table,
    Id,
    RoundId,
    PlayerId,
    Bid,
    Actual,
    Points,
}
