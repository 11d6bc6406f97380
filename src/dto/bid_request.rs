use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct BidRequest {
    pub player_id: Uuid,
    pub bid: i32,
}
