pub mod counting;
pub mod leaderboard;
pub mod quests;
