//! Archive download handler.

use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::web::error::WebError;
use crate::web::state::WebAppState;

const ARCHIVE_SUFFIX: &str = ".tgz";

/// Build (or reuse) the archive for `package` under `nonce` and stream it.
pub async fn get_archive(
    State(state): State<WebAppState>,
    Path((nonce, package)): Path<(String, String)>,
) -> Result<Response, WebError> {
    let name = package_name(&package);
    let archive = state.service().request_package(name, &nonce).await?;

    let file = tokio::fs::File::open(&archive).await?;
    let length = file.metadata().await?.len();
    let filename = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{name}{ARCHIVE_SUFFIX}"));

    tracing::debug!(package = %name, nonce = %nonce, archive = %archive.display(), "Serving archive");

    let headers = [
        (header::CONTENT_TYPE, content_type(&archive)),
        (header::CONTENT_LENGTH, length.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// `foo.tgz`, `foo`, `@scope/foo.tgz` → the package name.
fn package_name(raw: &str) -> &str {
    let raw = raw.trim_start_matches('/');
    raw.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(raw)
}

fn content_type(path: &FsPath) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tgz") | Some("gz") => "application/gzip".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
    }
}
