// Turn-based game rules

pub mod rules;

pub use rules::GameRules;
