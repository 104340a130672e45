//! # Adaverse
//!
//! A showcase for student projects: a public catalog, a moderated submission
//! queue and comments. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! adaverse = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adaverse::auth::ServiceKeyMode;
//! use adaverse::server::{AppState, create_router};
//! use adaverse::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/adaverse.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     ServiceKeyMode::Required("change-me".to_string()),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CSV import module. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
#[cfg(feature = "cli")]
pub mod import;
pub mod server;
pub mod store;
pub mod text;
pub mod types;
pub mod workflow;
