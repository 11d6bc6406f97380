//! Domain error taxonomy for the Zouk scorekeeper.
//!
//! Every variant except `Db` is a recoverable, user-visible rejection: the
//! action is refused with an explanation and stored state is left untouched.
//! Handlers return `Result<HttpResponse, GameError>` and rely on the
//! `ResponseError` impl for the JSON error body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, TransactionError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("operation is not allowed in the current phase: {0}")]
    InvalidPhase(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("player not found")]
    UnknownPlayer,

    #[error("round not found")]
    UnknownRound,

    #[error("no active game")]
    UnknownGame,

    #[error("game has already started")]
    AlreadyStarted,

    #[error("cannot start a game with no players")]
    NoPlayers,

    #[error("it is not this player's turn")]
    OutOfTurn,

    #[error("this value has already been recorded")]
    AlreadyRecorded,

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl GameError {
    pub fn invalid_phase(detail: impl Into<String>) -> Self {
        Self::InvalidPhase(detail.into())
    }

    pub fn invalid_value(detail: impl Into<String>) -> Self {
        Self::InvalidValue(detail.into())
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidPhase(_) => "invalid_phase",
            GameError::InvalidValue(_) => "invalid_value",
            GameError::UnknownPlayer => "unknown_player",
            GameError::UnknownRound => "unknown_round",
            GameError::UnknownGame => "unknown_game",
            GameError::AlreadyStarted => "already_started",
            GameError::NoPlayers => "no_players",
            GameError::OutOfTurn => "out_of_turn",
            GameError::AlreadyRecorded => "already_recorded",
            GameError::Db(_) => "internal",
        }
    }
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self {
            GameError::UnknownPlayer | GameError::UnknownRound | GameError::UnknownGame => {
                StatusCode::NOT_FOUND
            }
            GameError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let GameError::Db(err) = self {
            tracing::error!("database error: {err}");
        }
        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .json(json!({
                "error": self.code(),
                "message": self.to_string(),
            }))
    }
}

// Unwrap sea-orm's transaction wrapper so call sites can use plain `?`.
impl From<TransactionError<GameError>> for GameError {
    fn from(err: TransactionError<GameError>) -> Self {
        match err {
            TransactionError::Connection(e) => GameError::Db(e),
            TransactionError::Transaction(e) => e,
        }
    }
}
