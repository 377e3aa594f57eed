// Tablink - client-side query layer for a remote tabular data service

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod client;
pub mod config;
pub mod database;
pub mod datum;
pub mod filter;
pub mod model;
pub mod module;
pub mod public;
pub mod resolver;
pub mod selection;

// Re-exports for convenience
pub use client::{Client, HttpTransport, MockTransport, Request, Response, Transport};
pub use config::ClientConfig;
pub use database::Database;
pub use datum::Datum;
pub use filter::{Field, Filter, FilterItem, FilterList, Join, Operator};
pub use module::Module;
pub use selection::{Entry, HistoryQuery, ResultSet, Selection};

/// Tablink error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Malformed filter: {0}")]
        MalformedFilter(String),

        #[error("No record matched in module '{module}'")]
        EmptyMatch { module: String },

        #[error("Cannot determine target: {0}")]
        CannotDetermineTarget(String),

        #[error("Transport error: {0}")]
        Transport(String),

        #[error("Unexpected response: {0}")]
        UnexpectedResponse(String),

        #[error("Serialization error: {0}")]
        Serialization(#[from] serde_json::Error),

        #[error("Configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::error::Error;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyMatch {
            module: "shot_task".to_string(),
        };
        assert_eq!(err.to_string(), "No record matched in module 'shot_task'");

        let err = Error::CannotDetermineTarget("SNJ_EP01_sc001.nk".to_string());
        assert!(err.to_string().contains("SNJ_EP01_sc001.nk"));
    }
}
