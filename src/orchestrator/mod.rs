//! Application-level orchestration utilities.
//!
//! This module owns the invocation lifecycle (reset, dispatch, deadline, classification,
//! rendering, restoration), the interactive session loop that feeds it, and post-run
//! processing such as plot saving and exports. UI/CLI layers call into this module to
//! keep responsibilities separated.

mod controller;
mod post_process;
mod render;
mod session;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{RequestController, BUSY_LABEL, DEFAULT_DEADLINE, TRIGGER_LABEL};
pub(crate) use post_process::process_run_completion;
pub(crate) use render::render_row;
#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use session::{run_session, SessionEvent, UiCommand};
