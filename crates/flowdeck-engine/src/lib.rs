//! Flowdeck Engine
//!
//! Walks a loaded scenario node by node:
//!
//! - [`FlowSession`] owns the cursor over the pre-sorted nodes, the per-node
//!   run records, and the context writes made when a node completes.
//! - [`SubmissionRouter`] sends a step's output to the context store or a
//!   collection, following the node's `onSubmit` block.
//! - [`FlowView`] resolves the layout, step and widget components for the
//!   current node through the template directories and reports a
//!   [`FlowViewState`] that keeps every failure mode distinct.
//!
//! Progress is observable through [`FlowEvent`]s sent to a [`FlowNotifier`].

mod builtin;
mod component;
mod error;
mod events;
mod poll;
mod router;
mod session;
mod view;

pub use builtin::{SUMMARY_WIDGET, SummaryWidget, default_registry, register_builtins};
pub use component::{Component, FLOW_LAYOUT, FlowLayout, Layout, LayoutFrame};
pub use error::{FlowError, SubmitError};
pub use events::{ChannelNotifier, FlowEvent, FlowNotifier, NoopNotifier};
pub use poll::{PollError, poll_until};
pub use router::{Submission, SubmissionRouter};
pub use session::{Advance, FlowSession};
pub use view::{FlowView, FlowViewConfig, FlowViewState, ReadyView};
