pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod messenger;
pub mod search;
