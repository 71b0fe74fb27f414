//! Application-level orchestration.
//!
//! This module owns the submission lifecycle, the interactive command loop,
//! and post-result processing such as exports. UI/CLI layers call into this
//! module to keep responsibilities separated.

mod controller;
mod post_process;
mod submission;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{run_controller, UiCommand};
#[cfg(feature = "tui")]
pub(crate) use post_process::process_result_exports;
pub(crate) use post_process::run_exports;
pub(crate) use submission::SubmissionController;
