pub mod actual_request;
pub mod bid_request;
pub mod game_snapshot;
pub mod join_request;
pub mod seat_request;
