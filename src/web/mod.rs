//! HTTP façade over the pack service.

mod error;
mod handlers;
mod routes;
mod server;
mod state;

pub use error::WebError;
pub use server::{build_router, run_server, ServerConfig};
pub use state::WebAppState;
