pub mod api;
pub mod app;
pub mod config;
pub mod debounce;
pub mod duration;
pub mod export;
pub mod format;
pub mod models;
pub mod pipeline;
pub mod stats;

#[cfg(feature = "tui")]
pub mod tui;
