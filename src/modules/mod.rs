pub mod books;
pub mod pages;

use std::sync::Arc;

use shelf_db::SharedStore;
use shelf_kernel::{settings::Settings, ModuleRegistry};

/// Register the store module and every catalog module with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: SharedStore, settings: &Settings) {
    registry.register_core(shelf_db::create_module(Arc::clone(&store)));
    registry.register_custom(books::create_module(Arc::clone(&store)));
    registry.register_custom(pages::create_module(store, &settings.pages));
}
