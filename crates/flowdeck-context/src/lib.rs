//! Flowdeck Context
//!
//! The context store carries values produced by one flow step to the steps
//! after it. Values live under a root object per workspace and are addressed
//! with dot-delimited paths such as `fbCampaign.settings.budget`.
//!
//! The store is a cheap-to-clone handle. Pass it explicitly to whatever needs
//! it; every clone sees the same data.

mod error;
mod path;
mod store;
mod template;

pub use error::ContextError;
pub use path::{get_path, merge_path, set_path, split_path};
pub use store::ContextStore;
pub use template::process_template;
