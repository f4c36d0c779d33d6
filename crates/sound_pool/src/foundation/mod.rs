//! Foundation module - Core utilities
//!
//! Logging setup shared by the library and the demo binary.

pub mod logging;
