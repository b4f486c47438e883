//! Flowdeck Config
//!
//! This crate contains the serializable authoring types for flowdeck.
//! These types represent scenarios, nodes and template settings as they are
//! persisted by the authoring surfaces, before the engine validates them into
//! a runnable scenario.
//!
//! Configuration can be loaded from:
//! - JSON files (via the CLI)
//! - A document store (as JSON records)
//!
//! Field names follow the persisted camelCase layout (`tplFile`,
//! `contextPath`, `assistantMessage`, `dependsOn`, ...).

mod attrs;
mod component;
mod node;
mod retry;
mod scenario;
mod settings;

pub use attrs::{FieldDef, FormAttrs, LlmAttrs, OnSubmitDef, QuizAttrs, SubmitAction, WidgetAttrs};
pub use component::{ComponentKind, DEFAULT_TEMPLATE_DIRECTORY, TemplateDirectory};
pub use node::NodeDef;
pub use retry::{RetryBackoff, RetryPolicy};
pub use scenario::ScenarioDef;
pub use settings::{ApplicationSettings, WorkspaceSettings, resolve_template_directory};
