//! # Core
//!
//! Pure application logic: state, the action/effect reducer, per-chat
//! session views, timeline grouping, the upload queue, and configuration.
//! Nothing in this module knows about the terminal; the `tui` module is
//! the only consumer that does.

pub mod action;
pub mod config;
pub mod session;
pub mod state;
pub mod timeline;
pub mod uploads;
