//! Identifier generation.

use uuid::Uuid;

/// Returns a new opaque unique id: 32 lowercase hex digits.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
