//! services/api/src/web/identity.rs
//!
//! Reads the requester identity forwarded by the identity provider's proxy.

use axum::http::HeaderMap;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The opaque user id from the `x-user-id` header, if present and non-blank.
pub fn requester_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
