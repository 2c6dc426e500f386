//! Gatecheck CLI
//!
//! Offline inspection of rule tables, expectations computed from captured
//! backend responses, and YAML scenarios.

pub mod commands;
pub mod output;
