//! Shared test utilities for packserve
//!
//! - Package directory fixtures with a fake pack tool

pub mod package_fixtures;
