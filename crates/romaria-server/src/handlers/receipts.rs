//! `GET /receipts/{name}` — serves stored receipt artifacts.

use std::path::PathBuf;

use axum::{
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};

use crate::error::Error;

/// Read `receipts/<name>` under the blob root and serve it as HTML. The
/// name is a single path segment by construction of the route; traversal
/// characters are rejected anyway.
pub async fn handler(blob_dir: &PathBuf, name: &str) -> Result<Response, Error> {
  if name.contains('/') || name.contains("..") || name.is_empty() {
    return Err(Error::BadRequest("invalid receipt name".to_string()));
  }

  let path = blob_dir.join("receipts").join(name);
  match tokio::fs::read(&path).await {
    Ok(bytes) => Ok(
      (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        bytes,
      )
        .into_response(),
    ),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
    Err(e) => Err(Error::Io(e)),
  }
}
