//! API key discovery from the per-user key file.

use std::path::{Path, PathBuf};

use tracing::debug;

/// File name of the per-user key file, looked up under `$HOME`.
pub const KEY_FILE_NAME: &str = ".comet_rest_key";

/// Path of the per-user key file, or `None` when `HOME` is unset.
pub fn key_file_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(KEY_FILE_NAME))
}

/// Read the API key from the default per-user file.
///
/// Any failure (unset `HOME`, missing file, unreadable file) yields an
/// empty key rather than an error; calls made with an empty key fail at the
/// HTTP layer with the service's authorization error.
pub fn load_api_key() -> String {
    match key_file_path() {
        Some(path) => load_api_key_from(&path),
        None => String::new(),
    }
}

/// Read an API key from an explicit file, trimming surrounding whitespace.
pub fn load_api_key_from(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().to_string(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "api key file not loaded");
            String::new()
        }
    }
}
