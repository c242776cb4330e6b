//! Request DTOs for the demo API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Longest item name accepted by `POST /items`.
pub const MAX_ITEM_NAME_LENGTH: usize = 256;

/// Request body for creating an item (POST /items)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    /// Display name of the item
    pub name: String,
}

impl CreateItemRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Item name cannot be empty".to_string());
        }
        if self.name.len() > MAX_ITEM_NAME_LENGTH {
            return Some(format!(
                "Item name exceeds maximum length of {} characters",
                MAX_ITEM_NAME_LENGTH
            ));
        }
        None
    }
}
