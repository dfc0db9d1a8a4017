//! Upload slots and transfer targets.
//!
//! Pure value types. The upload server hands out [`UploadSlot`]s; the
//! sender builds its request URL from a [`TransferTarget`].

use std::path::{Path, PathBuf};

/// One ordinal in `0..n`, consumed by exactly one accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadSlot(usize);

impl UploadSlot {
    #[must_use]
    pub fn new(ordinal: usize) -> Self {
        Self(ordinal)
    }

    #[must_use]
    pub fn ordinal(self) -> usize {
        self.0
    }

    /// Storage file name: the stringified ordinal, no extension.
    #[must_use]
    pub fn file_name(self) -> String {
        self.0.to_string()
    }

    /// Destination of this slot's upload under `storage_root`.
    #[must_use]
    pub fn path_in(self, storage_root: &Path) -> PathBuf {
        storage_root.join(self.file_name())
    }
}

/// Prefix `endpoint` with `/` when it lacks one.
#[must_use]
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        endpoint.to_owned()
    } else {
        format!("/{endpoint}")
    }
}

/// Everything needed for one outbound upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub address: String,
    pub port: u16,
    pub endpoint: String,
    pub form_field: String,
    pub file_path: PathBuf,
}

impl TransferTarget {
    /// `http://address:port/endpoint`, bracketing IPv6 literals.
    #[must_use]
    pub fn url(&self) -> String {
        // Only IPv6 literals contain ':'.
        let host = if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]", self.address)
        } else {
            self.address.clone()
        };
        format!(
            "http://{host}:{}{}",
            self.port,
            normalize_endpoint(&self.endpoint)
        )
    }

    /// File name sent in the multipart part header.
    #[must_use]
    pub fn upload_name(&self) -> String {
        self.file_path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned())
    }
}
