//! Shared state passed to all API handlers

use crate::handlers::StoreHandlers;
use crate::mib::ObjectStore;

#[derive(Clone)]
pub struct ApiState {
    pub handlers: StoreHandlers,
}

impl ApiState {
    pub fn new(store: ObjectStore) -> Self {
        Self {
            handlers: StoreHandlers::new(store),
        }
    }

    pub fn store(&self) -> &ObjectStore {
        self.handlers.store()
    }
}
