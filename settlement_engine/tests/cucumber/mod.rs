mod settlement_world;
mod setups;
mod steps;

pub use settlement_world::{ScriptedScores, SettlementSystem, SettlementWorld};
