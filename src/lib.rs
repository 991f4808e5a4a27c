//! Lumen library exports for testing

pub mod core;
pub mod service;
pub mod tui;
