use std::path::Path;

use crate::error::RetrieveError;
use crate::feedback::Feedback;

/// Marker file at the root of an extracted bundle naming the version it
/// actually contains.
pub const VERSION_FILE: &str = "version.txt";

/// Read the trimmed content of the version marker in `root`.
///
/// A bundle without a marker is normal: `Ok(None)` is returned and nothing is
/// surfaced beyond a debug log. A blank marker counts as absent.
pub fn read_version_marker(root: &Path) -> Result<Option<String>, RetrieveError> {
    let path = root.join(VERSION_FILE);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let version = String::from_utf8_lossy(&bytes).trim().to_owned();
            Ok((!version.is_empty()).then_some(version))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "{VERSION_FILE} not found in the archive");
            Ok(None)
        }
        Err(e) => Err(RetrieveError::filesystem(path, e)),
    }
}

/// Build-log lines announcing where `library` came from.
///
/// The resolved version is only mentioned when it differs from the requested
/// one.
pub fn retrieval_feedback(
    library: &str,
    requested: &str,
    resolved: Option<&str>,
    source_url: &str,
) -> Vec<Feedback> {
    let mut lines = Vec::with_capacity(2);
    if let Some(resolved) = resolved.filter(|r| *r != requested) {
        lines.push(Feedback::info(format!(
            "Resolving version {resolved} of library {library}..."
        )));
    }
    lines.push(Feedback::info(format!("From HTTP URL: {source_url}")));
    lines
}
