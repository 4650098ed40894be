mod customers;
mod health;
mod queue;
mod routes;
mod sections;

pub use routes::api_routes;

use serde::Serialize;

/// Plain confirmation body for destructive operations
#[derive(Debug, Serialize)]
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
