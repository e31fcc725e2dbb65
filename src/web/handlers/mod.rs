//! HTTP request handlers for the packserve API.

pub mod archives;
pub mod packages;
