mod common;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::web::Data;
use common::test_bootstrap;
use serde_json::{json, Value};
use zouk_backend::game_management::session::ActiveGame;
use zouk_backend::live::UpdateHub;

// Each test builds its own app with a fresh active-game handle, so tests
// sharing the database never see each other's game.
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(Data::new($db.clone()))
                .app_data(Data::new(ActiveGame::default()))
                .app_data(Data::new(UpdateHub::default()))
                .configure(zouk_backend::configure_routes),
        )
        .await
    };
}

async fn post_json<S, B>(app: &S, uri: &str, body: Value) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = actix_web::test::TestRequest::post()
        .uri(uri)
        .set_json(body)
        .to_request();
    let res = actix_web::test::call_service(app, req).await;
    let status = res.status().as_u16();
    let body: Value = actix_web::test::read_body_json(res).await;
    (status, body)
}

async fn get_json<S, B>(app: &S, uri: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = actix_web::test::TestRequest::get().uri(uri).to_request();
    let res = actix_web::test::call_service(app, req).await;
    let status = res.status().as_u16();
    let body: Value = actix_web::test::read_body_json(res).await;
    (status, body)
}

async fn join<S, B>(app: &S, name: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = post_json(app, "/api/join", json!({ "name": name })).await;
    assert_eq!(status, 200, "join failed: {body}");
    body["player_id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn smoke_full_round() -> anyhow::Result<()> {
    let db = test_bootstrap().await;
    let app = test_app!(db);

    let ana = join(&app, "Ana").await;
    let ben = join(&app, "Ben").await;
    let cleo = join(&app, "Cleo").await;

    // Seats are assigned in join order
    let (status, state) = get_json(&app, "/api/state").await;
    assert_eq!(status, 200);
    assert_eq!(state["game"]["status"], "lobby");
    let seats: Vec<(&str, i64)> = state["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["name"].as_str().unwrap(), p["seat_number"].as_i64().unwrap()))
        .collect();
    assert_eq!(seats, vec![("Ana", 1), ("Ben", 2), ("Cleo", 3)]);

    // No round yet, so no actuals can be recorded
    let (status, body) =
        post_json(&app, "/api/actual", json!({ "player_id": ana, "actual": 0 })).await;
    assert_eq!(status, 400, "unexpected: {body}");

    let (status, started) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(started["round_number"], 1);
    assert_eq!(started["starter_player_id"].as_str().unwrap(), ana);
    assert_eq!(started["card_count"], 1);

    // Starting twice is rejected
    let (status, body) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "already_started");

    // Bids are strictly turn-ordered; Ben may not open
    let (status, body) = post_json(&app, "/api/bid", json!({ "player_id": ben, "bid": 1 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "out_of_turn");

    // Actuals are rejected until every bid is in
    let (status, body) =
        post_json(&app, "/api/actual", json!({ "player_id": cleo, "actual": 0 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_phase");

    // Negative bids never reach the round
    let (status, body) = post_json(&app, "/api/bid", json!({ "player_id": ana, "bid": -1 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_value");

    for (player, bid) in [(&ana, 0), (&ben, 1), (&cleo, 2)] {
        let (status, body) =
            post_json(&app, "/api/bid", json!({ "player_id": player, "bid": bid })).await;
        assert_eq!(status, 200, "bid failed: {body}");
    }

    // Last bid flipped the round without any confirmation step
    let (_, state) = get_json(&app, "/api/state").await;
    let round = &state["current_round"];
    assert_eq!(round["status"], "collecting_actuals");
    assert!(round["next_bidder_id"].is_null());

    // Rebidding after the flip is rejected
    let (status, _) = post_json(&app, "/api/bid", json!({ "player_id": ana, "bid": 0 })).await;
    assert_eq!(status, 400);

    // Actuals arrive out of seat order; only the last one closes the round
    let (status, body) =
        post_json(&app, "/api/actual", json!({ "player_id": cleo, "actual": 0 })).await;
    assert_eq!(status, 200, "actual failed: {body}");
    assert_eq!(body["round_closed"], false);

    let (_, body) = post_json(&app, "/api/actual", json!({ "player_id": ana, "actual": 0 })).await;
    assert_eq!(body["round_closed"], false);

    // A second actual for the same player is rejected
    let (status, body) =
        post_json(&app, "/api/actual", json!({ "player_id": ana, "actual": 1 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "already_recorded");

    let (_, body) = post_json(&app, "/api/actual", json!({ "player_id": ben, "actual": 1 })).await;
    assert_eq!(body["round_closed"], true);

    // Round 2 exists, seats rotated left, Ben starts from seat 1
    let (_, state) = get_json(&app, "/api/state").await;
    assert_eq!(state["game"]["rounds_completed"], 1);
    let round = &state["current_round"];
    assert_eq!(round["round_number"], 2);
    assert_eq!(round["status"], "collecting_bids");
    assert_eq!(round["starter_player_id"].as_str().unwrap(), ben);
    assert_eq!(round["next_bidder_id"].as_str().unwrap(), ben);
    let seats: Vec<(&str, i64)> = state["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["name"].as_str().unwrap(), p["seat_number"].as_i64().unwrap()))
        .collect();
    assert_eq!(seats, vec![("Ben", 1), ("Cleo", 2), ("Ana", 3)]);

    // Ana held her zero bid (+1 for round 1), Ben hit his bid (+2),
    // Cleo missed by two (-2)
    let (status, rows) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(status, 200);
    let totals: Vec<(&str, i64)> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["name"].as_str().unwrap(), r["total_points"].as_i64().unwrap()))
        .collect();
    assert_eq!(totals, vec![("Ben", 2), ("Ana", 1), ("Cleo", -2)]);

    let result = &state["last_closed_round"];
    assert_eq!(result["round_number"], 1);
    assert_eq!(result["best"]["name"], "Ben");
    assert_eq!(result["lowest"]["name"], "Cleo");

    Ok(())
}

#[actix_web::test]
async fn smoke_lifecycle_and_reset() -> anyhow::Result<()> {
    let db = test_bootstrap().await;
    let app = test_app!(db);

    // Starting with nobody joined means there is no game at all
    let (status, body) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 404, "unexpected: {body}");
    assert_eq!(body["error"], "unknown_game");

    join(&app, "Dana").await;
    let (status, _) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 200);

    let (status, _) = post_json(&app, "/api/close", json!({})).await;
    assert_eq!(status, 200);
    // Closing again is a no-op
    let (status, _) = post_json(&app, "/api/close", json!({})).await;
    assert_eq!(status, 200);

    // A closed game is read-only
    let (status, body) = post_json(&app, "/api/join", json!({ "name": "Eve" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_phase");
    let (status, _) = get_json(&app, "/api/state").await;
    assert_eq!(status, 200);

    // Keep-players reset returns to the lobby with the roster intact
    let (status, _) = post_json(&app, "/api/reset", json!({})).await;
    assert_eq!(status, 200);
    let (_, state) = get_json(&app, "/api/state").await;
    assert_eq!(state["game"]["status"], "lobby");
    assert_eq!(state["game"]["rounds_completed"], 0);
    assert_eq!(state["players"].as_array().unwrap().len(), 1);
    assert!(state["current_round"].is_null());

    // Full reset deletes the game entirely
    let (status, _) = post_json(&app, "/api/reset/full", json!({})).await;
    assert_eq!(status, 200);
    let (status, body) = get_json(&app, "/api/state").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "unknown_game");

    // The next join starts a fresh game
    join(&app, "Fay").await;
    let (_, state) = get_json(&app, "/api/state").await;
    assert_eq!(state["game"]["status"], "lobby");
    assert_eq!(state["players"].as_array().unwrap().len(), 1);

    Ok(())
}

#[actix_web::test]
async fn smoke_latecomer_during_actuals() -> anyhow::Result<()> {
    let db = test_bootstrap().await;
    let app = test_app!(db);

    let ana = join(&app, "Ana").await;
    let ben = join(&app, "Ben").await;

    let (status, _) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 200);

    for player in [&ana, &ben] {
        let (status, _) =
            post_json(&app, "/api/bid", json!({ "player_id": player, "bid": 0 })).await;
        assert_eq!(status, 200);
    }

    // Cleo arrives after bidding closed; she owes nothing this round
    let cleo = join(&app, "Cleo").await;
    let (status, body) =
        post_json(&app, "/api/actual", json!({ "player_id": cleo, "actual": 0 })).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "unknown_player");

    // The two original players finishing their actuals still closes the round
    let (_, body) = post_json(&app, "/api/actual", json!({ "player_id": ana, "actual": 0 })).await;
    assert_eq!(body["round_closed"], false);
    let (_, body) = post_json(&app, "/api/actual", json!({ "player_id": ben, "actual": 0 })).await;
    assert_eq!(body["round_closed"], true, "latecomer must not block the round");

    // Cleo is seated for round 2 with no retroactive score
    let (_, state) = get_json(&app, "/api/state").await;
    let round = &state["current_round"];
    assert_eq!(round["round_number"], 2);
    assert_eq!(round["status"], "collecting_bids");
    assert_eq!(state["players"].as_array().unwrap().len(), 3);
    let cleo_total = state["leaderboard"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Cleo")
        .unwrap()["total_points"]
        .as_i64()
        .unwrap();
    assert_eq!(cleo_total, 0);
    // Rotation puts Ben in seat 1, so he opens round 2
    assert_eq!(round["next_bidder_id"].as_str().unwrap(), ben);

    Ok(())
}

#[actix_web::test]
async fn smoke_roster_changes_mid_round() -> anyhow::Result<()> {
    let db = test_bootstrap().await;
    let app = test_app!(db);

    let gil = join(&app, "Gil").await;
    let hana = join(&app, "Hana").await;
    let ivo = join(&app, "Ivo").await;

    // Move Ivo up one seat while still in the lobby: Gil, Ivo, Hana
    let (status, _) = post_json(
        &app,
        &format!("/api/player/{ivo}/seat"),
        json!({ "direction": "up" }),
    )
    .await;
    assert_eq!(status, 200);
    // Moving seat 1 further up is a no-op
    let (status, _) = post_json(
        &app,
        &format!("/api/player/{gil}/seat"),
        json!({ "direction": "up" }),
    )
    .await;
    assert_eq!(status, 200);

    let (_, state) = get_json(&app, "/api/state").await;
    let seats: Vec<&str> = state["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(seats, vec!["Gil", "Ivo", "Hana"]);

    let (status, _) = post_json(&app, "/api/start", json!({})).await;
    assert_eq!(status, 200);

    // Gil and Ivo bid; Hana leaves before bidding
    for player in [&gil, &ivo] {
        let (status, _) =
            post_json(&app, "/api/bid", json!({ "player_id": player, "bid": 0 })).await;
        assert_eq!(status, 200);
    }
    let req = actix_web::test::TestRequest::delete()
        .uri(&format!("/api/player/{hana}"))
        .to_request();
    let res = actix_web::test::call_service(&app, req).await;
    assert!(res.status().is_success());

    // The removal completed the bidding phase for the remaining two
    let (_, state) = get_json(&app, "/api/state").await;
    assert_eq!(state["current_round"]["status"], "collecting_actuals");
    assert_eq!(state["players"].as_array().unwrap().len(), 2);

    // Removing an unknown player is a 404
    let req = actix_web::test::TestRequest::delete()
        .uri(&format!("/api/player/{hana}"))
        .to_request();
    let res = actix_web::test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 404);

    Ok(())
}
