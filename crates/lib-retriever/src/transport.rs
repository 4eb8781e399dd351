use std::path::{Path, PathBuf};

use url::Url;

use crate::credentials::UsernamePassword;
use crate::error::RetrieveError;

/// Outcome of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered 200.
    Available,
    /// The server answered 401, even after credentials were offered.
    Unauthorized,
    /// Any other status. Redirects and server errors land here too.
    NotFound,
    /// The request never produced a status.
    Unreachable(String),
}

impl ProbeOutcome {
    /// Classify a final HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Available,
            401 => Self::Unauthorized,
            _ => Self::NotFound,
        }
    }
}

/// A downloaded archive, waiting to be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub archive: PathBuf,
    pub status: u16,
}

/// How a request authenticates.
#[derive(Debug, Clone, Copy)]
pub struct Authentication<'a> {
    pub credential: Option<&'a UsernamePassword>,
    /// Attach the credential to the first request rather than on challenge.
    pub preemptive: bool,
}

impl<'a> Authentication<'a> {
    pub fn anonymous() -> Self {
        Self {
            credential: None,
            preemptive: false,
        }
    }

    pub fn new(credential: Option<&'a UsernamePassword>, preemptive: bool) -> Self {
        Self {
            credential,
            preemptive,
        }
    }

    /// Whether the first request carries the credential.
    pub fn sends_upfront(&self) -> bool {
        self.preemptive && self.credential.is_some()
    }
}

/// The network side of retrieval.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Check that `url` exists without downloading it.
    async fn probe(&self, url: &Url, auth: Authentication<'_>) -> ProbeOutcome;

    /// Download `url` into `destination`, creating its parent directories.
    async fn download(
        &self,
        url: &Url,
        auth: Authentication<'_>,
        destination: &Path,
    ) -> Result<FetchResult, RetrieveError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn probe(&self, url: &Url, auth: Authentication<'_>) -> ProbeOutcome {
        (**self).probe(url, auth).await
    }

    async fn download(
        &self,
        url: &Url,
        auth: Authentication<'_>,
        destination: &Path,
    ) -> Result<FetchResult, RetrieveError> {
        (**self).download(url, auth, destination).await
    }
}

/// File name the archive at `url` is stored under: the last path segment,
/// or `<library>.zip` when the path ends in a slash.
pub fn archive_file_name(url: &Url, library: &str) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{library}.zip"))
}
