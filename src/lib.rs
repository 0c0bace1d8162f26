//! Bookmark manager served over a small typed router
//!
//! `routing` owns pattern matching and dispatch, `bookmarks` the handlers
//! mounted on it, `store` the persistence behind them, and `server` the
//! hyper plumbing that feeds requests in.

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod store;
