//! Application state shared by all handlers.

use droplan_core::Config;
use droplan_registry::Registry;

pub struct AppState {
    pub config: Config,
    pub registry: Registry,
}

impl AppState {
    pub fn new(config: Config, registry: Registry) -> Self {
        AppState { config, registry }
    }
}
