//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Per-request access logging (method and URL)
//! - Error and warning logging
//! - File-based logging support

pub mod writer;

use crate::config::Config;
use chrono::Local;
use hyper::{Method, Uri};
use std::net::SocketAddr;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;
    writer::get().set_access_enabled(config.logging.access_log);
    Ok(())
}

/// Prefix a message with the local wall-clock time
fn stamp(message: &str) -> String {
    format!("{} {message}", Local::now().format(TIMESTAMP_FORMAT))
}

/// Write to info/access log
fn write_info(message: &str) {
    let line = stamp(message);
    if writer::is_initialized() {
        writer::get().write_info(&line);
    } else {
        println!("{line}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    let line = stamp(message);
    if writer::is_initialized() {
        writer::get().write_error(&line);
    } else {
        eprintln!("{line}");
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    let line = stamp(message);
    if writer::is_initialized() {
        if writer::get().access_enabled() {
            writer::get().write_access(&line);
        }
    } else {
        println!("{line}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("File root: {}", config.files.root.display()));
    for route in &config.files.routes {
        write_info(&format!("Route: {route}"));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

/// Access line: method and full URL (path + query)
pub fn log_request(method: &Method, uri: &Uri) {
    write_access(&format_request(method, uri));
}

pub fn format_request(method: &Method, uri: &Uri) -> String {
    let url = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    format!("{method} {url}")
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}
