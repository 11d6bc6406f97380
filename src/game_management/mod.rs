//! HTTP surface of the scorekeeper.
//!
//! Handlers stay thin: parse the request, run the matching controller or
//! round-flow transaction, fan out a live update, serialize the response.

pub mod rotation;
pub mod round_flow;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod turn_order;

use actix_web::{delete, get, post, web, HttpResponse, Result as ActixResult};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::dto::actual_request::ActualRequest;
use crate::dto::bid_request::BidRequest;
use crate::dto::join_request::JoinRequest;
use crate::dto::seat_request::SeatRequest;
use crate::error::GameError;
use crate::live::UpdateHub;
use self::session::{ActiveGame, SeatDirection};

#[post("/join")]
pub async fn join_game(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
    body: web::Json<JoinRequest>,
) -> ActixResult<HttpResponse, GameError> {
    let player = session::join(&db, &active, &body.name).await?;
    info!(player_id = %player.id, name = %player.name, "player joined");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({
        "player_id": player.id,
        "name": player.name,
        "seat_number": player.seat_number,
    })))
}

#[post("/start")]
pub async fn start_game(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
) -> ActixResult<HttpResponse, GameError> {
    let round = session::start(&db, &active).await?;
    info!(round_number = round.round_number, "game started");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({
        "round_number": round.round_number,
        "starter_player_id": round.starter_player_id,
        "card_count": round.card_count,
        "trump_suit": round.trump_suit,
    })))
}

#[post("/bid")]
pub async fn submit_bid(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
    body: web::Json<BidRequest>,
) -> ActixResult<HttpResponse, GameError> {
    if body.bid < 0 {
        return Err(GameError::invalid_value("bid must be non-negative"));
    }
    let game_id = active.require().await?;
    let (player_id, bid) = (body.player_id, body.bid);
    db.transaction(move |txn| Box::pin(round_flow::record_bid_txn(game_id, player_id, bid, txn)))
        .await?;
    hub.notify(false).await;
    Ok(HttpResponse::Ok().json(json!({ "recorded": "bid" })))
}

#[post("/actual")]
pub async fn submit_actual(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
    body: web::Json<ActualRequest>,
) -> ActixResult<HttpResponse, GameError> {
    if body.actual < 0 {
        return Err(GameError::invalid_value("actual must be non-negative"));
    }
    let game_id = active.require().await?;
    let (player_id, actual) = (body.player_id, body.actual);
    let closed = db
        .transaction(move |txn| {
            Box::pin(round_flow::record_actual_txn(game_id, player_id, actual, txn))
        })
        .await?;
    if closed {
        info!("round closed");
    }
    // A round boundary is worth waking even a lone viewer for
    hub.notify(closed).await;
    Ok(HttpResponse::Ok().json(json!({ "recorded": "actual", "round_closed": closed })))
}

#[get("/state")]
pub async fn get_state(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
) -> ActixResult<HttpResponse, GameError> {
    let snapshot = session::build_snapshot(&db, &active).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[get("/leaderboard")]
pub async fn get_leaderboard(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
) -> ActixResult<HttpResponse, GameError> {
    let rows = session::leaderboard(&db, &active).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/player/{id}/seat")]
pub async fn move_seat(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
    path: web::Path<Uuid>,
    body: web::Json<SeatRequest>,
) -> ActixResult<HttpResponse, GameError> {
    let direction = SeatDirection::parse(&body.direction)?;
    session::reorder_seat(&db, &active, path.into_inner(), direction).await?;
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({ "moved": body.direction })))
}

#[delete("/player/{id}")]
pub async fn remove_player(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse, GameError> {
    let player_id = path.into_inner();
    session::remove_player(&db, &active, player_id).await?;
    info!(%player_id, "player removed");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({ "removed": player_id })))
}

#[post("/close")]
pub async fn close_game(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
) -> ActixResult<HttpResponse, GameError> {
    session::close(&db, &active).await?;
    info!("game closed");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({ "status": "closed" })))
}

#[post("/reset")]
pub async fn reset_game(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
) -> ActixResult<HttpResponse, GameError> {
    session::reset_keeping_players(&db, &active).await?;
    info!("game reset, roster kept");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({ "status": "lobby" })))
}

#[post("/reset/full")]
pub async fn reset_game_full(
    db: web::Data<DatabaseConnection>,
    active: web::Data<ActiveGame>,
    hub: web::Data<UpdateHub>,
) -> ActixResult<HttpResponse, GameError> {
    session::reset_full(&db, &active).await?;
    info!("game deleted");
    hub.notify(true).await;
    Ok(HttpResponse::Ok().json(json!({ "status": "empty" })))
}
