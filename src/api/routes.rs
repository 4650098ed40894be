use axum::{
    routing::{get, post, put},
    Router,
};

use crate::server::AppState;

use super::customers::{
    create_customer, delete_customer, get_customer, list_customers, update_customer,
};
use super::health::{health, stats};
use super::queue::{finish_customer, get_queue, join_queue, remove_queue_entry};
use super::sections::{create_section, delete_section, list_sections, rename_section};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        // Sections
        .route("/sections", post(create_section).get(list_sections))
        .route(
            "/sections/{id}",
            put(rename_section).delete(delete_section),
        )
        // Customers; GET takes a membership number, PUT/DELETE take an id
        .route("/customers", post(create_customer).get(list_customers))
        .route(
            "/customers/{key}",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
        // Queue; GET takes a section name, DELETE takes an entry id
        .route("/queue", post(join_queue))
        .route("/queue/{key}", get(get_queue).delete(remove_queue_entry))
        .route("/finish-customer/{section}", post(finish_customer))
}
