// dbprobe library crate
// Exposes modules for integration testing

pub mod alerts;
pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod output;
pub mod storage;
