//! Shared state for the web server.

use std::sync::Arc;

use crate::pack::PackService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct WebAppState {
    service: Arc<PackService>,
}

impl WebAppState {
    pub fn new(service: PackService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn service(&self) -> &PackService {
        &self.service
    }
}
