use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ActualRequest {
    pub player_id: Uuid,
    pub actual: i32,
}
