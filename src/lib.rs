//! Gridhaul - Turn-Synchronous Fleet Dispatch Agent

pub mod auth;
pub mod core;
pub mod engine;
pub mod ipc;
pub mod model;
