pub mod catalog;
pub mod config;
pub mod model;
pub mod parser;
pub mod query;
pub mod simulation;
pub mod state;
