// Infrastructure layer (shared components)
pub mod config;
pub mod error;
pub mod events;
pub mod store;

// Domain layer (business logic)
pub mod customer;
pub mod queue;
pub mod section;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;
