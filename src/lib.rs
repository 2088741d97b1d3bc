pub mod analytics;
pub mod app;
pub mod clock;
pub mod config;
pub mod format;
pub mod import;
pub mod models;
pub mod payload;
pub mod provider;
pub mod range;
pub mod reconstruct;
