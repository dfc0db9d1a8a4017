//! Outbound multipart upload of one local file.

use anyhow::Result;
use reqwest::multipart::{Form, Part};

use crate::domain::error::ClusterError;
use crate::domain::transfer::TransferTarget;

/// Upload `target.file_path` to `target.url()` with the given client.
///
/// One attempt, whole file in memory. Returns the number of bytes sent.
///
/// # Errors
///
/// Returns `ClusterError::Storage` if the file cannot be read and
/// `ClusterError::Transfer` on a network failure or non-2xx response.
pub async fn send_file(client: &reqwest::Client, target: &TransferTarget) -> Result<usize> {
    let bytes = tokio::fs::read(&target.file_path)
        .await
        .map_err(|source| ClusterError::Storage {
            path: target.file_path.clone(),
            source,
        })?;
    let len = bytes.len();

    let part = Part::bytes(bytes).file_name(target.upload_name());
    let form = Form::new().part(target.form_field.clone(), part);
    let url = target.url();

    tracing::info!(%url, bytes = len, "sending file");
    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| ClusterError::Transfer {
            message: format!("POST {url}: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClusterError::Transfer {
            message: format!("POST {url} returned {status}: {}", body.trim()),
        }
        .into());
    }
    tracing::debug!(%url, %status, "upload accepted");
    Ok(len)
}

/// Upload with a fresh default client.
///
/// # Errors
///
/// See [`send_file`].
pub async fn send(target: &TransferTarget) -> Result<usize> {
    send_file(&reqwest::Client::new(), target).await
}
