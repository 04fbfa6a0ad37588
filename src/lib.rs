//! AUTOLEND: recurring micro-investments on P2P lending marketplaces
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod gateway;
pub mod lenders;
pub mod policy;
pub mod engine;
