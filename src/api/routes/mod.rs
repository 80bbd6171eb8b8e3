pub mod history;
pub mod match_play;
