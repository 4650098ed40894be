use std::sync::Arc;

use crate::config::Settings;
use crate::customer::CustomerDirectory;
use crate::events::EventHub;
use crate::queue::QueueEngine;
use crate::section::SectionDirectory;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub hub: Arc<EventHub>,
    pub engine: Arc<QueueEngine>,
    pub sections: Arc<SectionDirectory>,
    pub customers: Arc<CustomerDirectory>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn RecordStore>) -> Self {
        let hub = Arc::new(EventHub::new(settings.events.capacity));
        let engine = Arc::new(QueueEngine::new(store.clone(), hub.clone()));
        let sections = Arc::new(SectionDirectory::new(
            store.clone(),
            engine.clone(),
            hub.clone(),
        ));
        let customers = Arc::new(CustomerDirectory::new(store));

        Self {
            settings: Arc::new(settings),
            hub,
            engine,
            sections,
            customers,
        }
    }
}
