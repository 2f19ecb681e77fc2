//! Data models for the RateMyBite application.
//!
//! Field names serialize in camelCase to match the browser client.

mod category;
mod claim;
mod restaurant;
mod review;
mod user;

pub use category::*;
pub use claim::*;
pub use restaurant::*;
pub use review::*;
pub use user::*;

use serde::Serialize;

/// Confirmation body for deletions and other actions without a resource to return.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
