//! Flowdeck Component Registry
//!
//! Resolves `(template directory, kind, component id)` triples to module
//! paths and loads the component registered at that path, falling back to
//! the default template directory when the tenant does not provide one.
//!
//! Components are registered ahead of time in a [`StaticRegistry`], so the
//! set of loadable paths is known before anything is requested.

mod error;
mod loader;
mod registry;
mod resolver;
mod slot;

pub use error::{LoadError, ModuleError};
pub use loader::{ComponentLoader, LoadRequest, LoadResult};
pub use registry::{LoadFuture, Module, ModuleFactory, ModuleSource, StaticRegistry};
pub use resolver::{ComponentPath, DEFAULT_EXTENSION, TemplateResolver};
pub use slot::ComponentSlot;
