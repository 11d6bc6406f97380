pub mod games;
pub mod players;
pub mod rounds;
pub mod score_entries;

pub use games::Entity as Games;
pub use players::Entity as Players;
pub use rounds::Entity as Rounds;
pub use score_entries::Entity as ScoreEntries;
