pub mod cli;
pub mod config;
pub mod error;
pub mod fsutils;
pub mod setup;
