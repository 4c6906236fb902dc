//! api-updates
//!
//! Evolving a compiled library's public surface without breaking binaries
//! already built against it. The rules live in [`api_updates_core`], the
//! reference library that follows them in [`api_updates_ffi`]; this crate
//! wires both to configuration, logging and the demo binary.

pub mod config;
pub mod demo;
pub mod utils;
