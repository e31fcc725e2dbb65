//! Route definitions.

use axum::{routing::get, Router};

use crate::web::handlers::{archives, packages};
use crate::web::state::WebAppState;

/// REST endpoints mounted under `/api`.
pub fn api_routes() -> Router<WebAppState> {
    Router::new().route("/packages", get(packages::list_packages))
}

/// Archive downloads: `/{nonce}/{package}`, where the package may be scoped
/// and may carry a `.tgz` suffix.
pub fn archive_routes() -> Router<WebAppState> {
    Router::new().route("/{nonce}/{*package}", get(archives::get_archive))
}
