//! CLI Commands

pub mod classify;
pub mod config;
pub mod expect;
pub mod rules;
pub mod scenarios;
