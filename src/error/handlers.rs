//! Error handlers
//!
//! Logs server errors and turns protocol errors into responses.

use log::error;

use crate::error::types::{ProtocolError, ServerError};
use crate::protocol::Response;

/// Handle a server error that ended a connection
pub fn handle_error(err: &ServerError) {
    error!("Static server error: {}", err);
}

/// Build the response sent for a request head that could not be parsed
pub fn error_response(err: &ProtocolError) -> Response {
    Response::error(err.status_code())
}
