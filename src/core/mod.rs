//! Core machinery: checks, chains, reports, secrets lifecycle, exec wrapper.

pub mod chain;
pub mod check;
pub mod context;
pub mod error;
pub mod exec;
pub mod orchestrator;
pub mod secrets;
pub mod template;
pub mod time;
pub mod tui;
