#![forbid(unsafe_code)]

//! Core domain model and business logic for the Medlog medication tracker.
//!
//! This crate provides:
//! - Domain types (dose logs, medicine cards, filters, banners)
//! - Persistence of the log list (JSON slot with atomic writes)
//! - Derived views (latest per medicine, filtered table)
//! - The state machine for recording, editing and deleting doses
//! - Rendering and CSV export

pub mod types;
pub mod error;
pub mod cards;
pub mod config;
pub mod logging;
pub mod store;
pub mod aggregate;
pub mod app;
pub mod tracker;
pub mod render;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use cards::CardSet;
pub use config::Config;
pub use store::{JsonFileStore, LogStore, MemoryStore};
pub use app::{Action, AppState, Dialog, Outcome, Policy};
pub use tracker::Tracker;
pub use render::{CardLabel, Row, TableView};
pub use export::export_csv;
