//! Integration tests for packserve

#[path = "../common/mod.rs"]
pub mod common;

pub mod bump_flow;
pub mod cli;
pub mod http_flow;
pub mod pack_flow;
