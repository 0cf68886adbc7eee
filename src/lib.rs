pub mod app;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod language;
pub mod refine;
pub mod session;
pub mod shared;
pub mod store;
pub mod tui;
