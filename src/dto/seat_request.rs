use serde::Deserialize;

#[derive(Deserialize)]
pub struct SeatRequest {
    /// "up" moves the player one seat closer to seat 1, "down" one seat away.
    pub direction: String,
}
