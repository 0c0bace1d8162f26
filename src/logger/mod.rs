//! Logger module
//!
//! Provides logging utilities for the bookmark server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Level-filtered info, debug, warning and error messages
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use crate::routing::RouteTable;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        Level::parse(&config.logging.level),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Bookmark server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!(
        "Response format: {:?}",
        config.bookmarks.response_format
    ));
    write_info(&format!(
        "Authentication: {}",
        if config.auth.enabled { "enabled" } else { "disabled" }
    ));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

/// One line per registered route, in match order
pub fn log_routes(table: &RouteTable) {
    if !writer::enabled(Level::Debug) {
        return;
    }
    for route in table.iter() {
        write_info(&format!(
            "[Route] {:<6} {}{}",
            route.verb,
            route.pattern.template(),
            if route.gated { " (login required)" } else { "" }
        ));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, limit: u64) {
    log_warning(&format!(
        "[Connection] Rejected {peer_addr}: limit of {limit} connections reached"
    ));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Terminal dispatch failure; every one is reported, none suppressed
pub fn log_dispatch_failure(method: &str, path: &str, status: u16, err: &impl std::fmt::Display) {
    let message = format!("[Dispatch] {method} {path} -> {status}: {err}");
    if status >= 500 {
        log_error(&message);
    } else {
        log_info(&message);
    }
}

pub fn log_debug(message: &str) {
    if writer::enabled(Level::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_info(message: &str) {
    if writer::enabled(Level::Info) {
        write_info(message);
    }
}

pub fn log_warning(message: &str) {
    if writer::enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Stopped accepting connections");
}
