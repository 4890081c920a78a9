//! Logging middleware
//!
//! Provides request logging functionality.

use std::net::SocketAddr;

use log::info;

use crate::protocol::Request;

/// Log a client connection
pub fn log_connection(client_addr: &SocketAddr) {
    info!("Client connected: {}", client_addr);
}

/// Log an incoming request
pub fn log_request(client_addr: &SocketAddr, request: &Request) {
    info!("{} {} {}", client_addr, request.method, request.original_url);
}

/// Log the status a request was answered with
pub fn log_response(client_addr: &SocketAddr, request: &Request, status: u16) {
    if request.url == request.original_url {
        info!("{} {} -> {}", client_addr, request.original_url, status);
    } else {
        info!(
            "{} {} (as {}) -> {}",
            client_addr, request.original_url, request.url, status
        );
    }
}

/// Log a request head that was rejected before reaching the middlewares
pub fn log_rejected(client_addr: &SocketAddr, status: u16, reason: &str) {
    info!("{} rejected with {}: {}", client_addr, status, reason);
}
