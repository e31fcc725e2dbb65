//! Package listing handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::web::state::WebAppState;

/// Response for listing served packages.
#[derive(Debug, Serialize)]
pub struct ListPackagesResponse {
    pub packages: Vec<String>,
}

/// List all served package names.
pub async fn list_packages(State(state): State<WebAppState>) -> Json<ListPackagesResponse> {
    Json(ListPackagesResponse {
        packages: state.service().list(),
    })
}
