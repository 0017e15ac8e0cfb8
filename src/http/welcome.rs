//! Greeting served at the mount point.

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

pub const WELCOME: &str = "Welcome to SockJS!\n";

pub fn handle() -> Response {
    ([(CONTENT_TYPE, "text/plain; charset=UTF-8")], WELCOME).into_response()
}
