//! UPS status queries
//!
//! Builds apcaccess invocations and runs them with a hard deadline.

mod command;
mod runner;

use std::time::Duration;

use thiserror::Error;

pub use command::{CommandSpec, StatusQuery, DEFAULT_COMMAND};
pub use runner::{QueryRunner, DEFAULT_TIMEOUT_SECS};

/// Status query errors
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("apcaccess failed ({}): {stderr}", exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("apcaccess timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("apcaccess command not found: {0}")]
    CommandNotFound(String),

    #[error("I/O error running apcaccess: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit={code}"),
        None => "terminated by signal".to_string(),
    }
}
