//! Shared building blocks for SHELF processes: layered settings and the
//! module lifecycle every catalog replica goes through.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
