//! Deskbot
//!
//! Chat assistant for an internal IT department: registration, an inline
//! menu tree, the on-call duty schedule with a calendar picker, usage
//! statistics, subscriber broadcasts, and the ERP door-passage watcher.

pub mod bot;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod external;
pub mod gateway;
pub mod jobs;
pub mod logger;
pub mod menu;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod sessions;
pub mod state;

pub use state::AppState;
