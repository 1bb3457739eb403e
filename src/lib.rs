//! Common functionality for powerplan.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod config;
pub mod cost;
pub mod error;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod network;
pub mod optimisation;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod time_series;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory where the program's configuration files are stored
pub fn get_powerplan_config_dir() -> PathBuf {
    let Some(mut dir) = dirs::config_dir() else {
        // No config directory for this platform, so fall back on the working directory
        return PathBuf::new();
    };

    dir.push("powerplan");
    dir
}
