// Public API for integration tests and potential library usage

pub mod abuse;
pub mod answer;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod progression;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;

// Re-export broadcast for testing
pub mod broadcast;
