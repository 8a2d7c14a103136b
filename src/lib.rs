pub mod bet;
pub mod commands;
pub mod roulette;
pub mod table;
