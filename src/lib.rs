pub mod commands;
pub mod exec;
pub mod git;
pub mod graph;
pub mod judge;
pub mod models;
pub mod timestamp;
pub mod verify;
