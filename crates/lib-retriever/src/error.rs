use std::path::PathBuf;

/// Errors that abort a library retrieval.
///
/// Every component reports through this type and the retriever propagates it
/// unchanged; the lease is released before the error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    /// The URL template is configured but empty.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The execution context has no base workspace to lease a directory from.
    #[error("cannot check out library {library}: no workspace available for {owner}")]
    NoWorkspace { library: String, owner: String },

    /// DNS, connect, timeout or body stream failure.
    #[error("failed to reach {url}: {cause}")]
    Transport { url: String, cause: String },

    /// Terminal non-200 status after the authentication strategy ran out.
    #[error("failed to download {url}: HTTP {status}")]
    Download { url: String, status: u16 },

    #[error("I/O error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem work on a leased directory never finished because the
    /// runtime shut down under it.
    #[error("work on {} was interrupted", path.display())]
    Interrupted { path: PathBuf },
}

impl RetrieveError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
