use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::config::RetrieverConfig;
use crate::context::ExecutionContext;
use crate::copy::copy_tree;
use crate::credentials::{CredentialStore, find_credential, lookup_credential};
use crate::error::RetrieveError;
use crate::extract::expand_into_lease;
use crate::feedback::{Feedback, LogSink};
use crate::lease::{DEFAULT_WORKSPACE_SUFFIX, Lease, LeaseManager, lease_directory};
use crate::template::resolve_url;
use crate::transport::{Authentication, ProbeOutcome, Transport, archive_file_name};
use crate::version::{VERSION_FILE, read_version_marker, retrieval_feedback};

/// A completed retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub library: String,
    pub source_url: String,
    pub requested_version: String,
    /// Content of the bundle's version marker, if it had one.
    pub resolved_version: Option<String>,
    pub target: PathBuf,
}

impl Retrieval {
    pub fn effective_version(&self) -> &str {
        self.resolved_version
            .as_deref()
            .unwrap_or(&self.requested_version)
    }
}

/// Result of checking that a version can be retrieved.
///
/// Validation never blocks anything: problems come back as warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok(String),
    Warning(String),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Ok(msg) | Self::Warning(msg) => msg,
        }
    }

    /// Map a probe outcome for `version` at `url` to a validation message.
    pub fn from_probe(outcome: ProbeOutcome, version: &str, url: &Url) -> Self {
        match outcome {
            ProbeOutcome::Available if url.scheme() == "https" => {
                Self::Ok(format!("Version {version} is valid."))
            }
            ProbeOutcome::Available => Self::Warning(format!(
                "Version {version} is valid, but {url} is not served over HTTPS. \
                 Credentials and library content are sent in clear text."
            )),
            ProbeOutcome::Unauthorized => {
                Self::Warning("You are not authorized to access this URL...".into())
            }
            ProbeOutcome::NotFound => Self::Warning("This URL does not exist...".into()),
            ProbeOutcome::Unreachable(cause) => Self::cannot_validate(cause),
        }
    }

    fn cannot_validate(cause: impl std::fmt::Display) -> Self {
        Self::Warning(format!("Cannot validate default version: {cause}"))
    }
}

impl std::fmt::Display for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
        }
    }
}

/// Something that can materialize a named, versioned library.
#[async_trait::async_trait]
pub trait LibraryRetriever: Send + Sync {
    /// Fetch `library` at `version` into `target`.
    ///
    /// Returns `Ok(None)` when no URL template is configured at all.
    async fn retrieve(
        &self,
        library: &str,
        version: &str,
        target: &Path,
        context: &ExecutionContext,
        log: &dyn LogSink,
    ) -> Result<Option<Retrieval>, RetrieveError>;

    /// Check that `library` at `version` looks retrievable.
    async fn validate_version(&self, library: &str, version: &str) -> Validation;
}

/// One library retrieval, once its URL is known.
#[derive(Clone, Copy)]
struct Job<'a> {
    library: &'a str,
    version: &'a str,
    url: &'a Url,
    target: &'a Path,
}

/// Retrieves libraries published as archives at a templated URL.
pub struct Retriever<T> {
    config: RetrieverConfig,
    transport: T,
    credentials: Arc<dyn CredentialStore>,
    leases: LeaseManager,
    workspace_suffix: String,
}

impl<T: Transport> Retriever<T> {
    pub fn new(
        config: RetrieverConfig,
        transport: T,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
            leases: LeaseManager::new(),
            workspace_suffix: DEFAULT_WORKSPACE_SUFFIX.to_owned(),
        }
    }

    /// Share a lease table with other retrievers so they serialize on the
    /// same directories.
    pub fn with_lease_manager(mut self, leases: LeaseManager) -> Self {
        self.leases = leases;
        self
    }

    pub fn with_workspace_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.workspace_suffix = suffix.into();
        self
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn leases(&self) -> &LeaseManager {
        &self.leases
    }

    /// Resolve the configured template for `library` at `version`.
    ///
    /// `Ok(None)` means no template is configured. A template of blanks is
    /// not empty and fails as an invalid URL instead.
    pub fn resolve(&self, library: &str, version: &str) -> Result<Option<Url>, RetrieveError> {
        let Some(template) = self.config.http_url.as_deref() else {
            return Ok(None);
        };
        if template.is_empty() {
            return Err(RetrieveError::Configuration(format!(
                "the URL of library {library} is empty"
            )));
        }

        let resolved = resolve_url(template, library, version);
        Url::parse(&resolved)
            .map(Some)
            .map_err(|e| RetrieveError::InvalidUrl {
                url: resolved,
                reason: e.to_string(),
            })
    }

    async fn fetch_and_materialize(
        &self,
        lease: Lease,
        job: &Job<'_>,
        context: &ExecutionContext,
        log: &dyn LogSink,
    ) -> Result<Retrieval, RetrieveError> {
        let Job {
            library,
            version,
            url,
            target,
        } = *job;

        let (lease, cleared) = on_blocking_pool(lease, Lease::clear).await?;
        cleared?;

        let credential = lookup_credential(
            self.credentials.as_ref(),
            self.config.credentials_id.as_deref(),
            Some(context),
        );
        let auth = Authentication::new(credential.as_ref(), self.config.preemptive_auth);

        let destination = lease.path().join(archive_file_name(url, library));
        let fetched = self.transport.download(url, auth, &destination).await?;
        tracing::debug!(%url, status = fetched.status, "archive downloaded");

        let archive = fetched.archive;
        let copy_to = target.to_path_buf();
        let (mut lease, materialized) = on_blocking_pool(lease, move |lease| {
            expand_into_lease(lease, &archive)?;
            let marker = read_version_marker(lease.path());
            copy_tree(lease.path(), &copy_to)?;
            Ok::<_, RetrieveError>(marker)
        })
        .await?;
        lease.release();

        let resolved_version = match materialized? {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(library, error = %e, "ignoring unreadable version marker");
                log.emit(Feedback::warning(format!("Ignoring unreadable {VERSION_FILE}: {e}")));
                None
            }
        };
        let source = url.as_str();
        for line in retrieval_feedback(library, version, resolved_version.as_deref(), source) {
            log.emit(line);
        }

        Ok(Retrieval {
            library: library.to_owned(),
            source_url: url.to_string(),
            requested_version: version.to_owned(),
            resolved_version,
            target: target.to_path_buf(),
        })
    }
}

/// Run filesystem work on `lease` off the async workers.
///
/// The lease moves into the blocking task, so it stays held until the work
/// finishes even when the caller stops waiting for it.
async fn on_blocking_pool<R, F>(lease: Lease, work: F) -> Result<(Lease, R), RetrieveError>
where
    F: FnOnce(&Lease) -> R + Send + 'static,
    R: Send + 'static,
{
    let path = lease.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        let output = work(&lease);
        (lease, output)
    })
    .await
    .map_err(|e| match e.try_into_panic() {
        Ok(panic) => std::panic::resume_unwind(panic),
        Err(_) => RetrieveError::Interrupted { path },
    })
}

#[async_trait::async_trait]
impl<T: Transport> LibraryRetriever for Retriever<T> {
    async fn retrieve(
        &self,
        library: &str,
        version: &str,
        target: &Path,
        context: &ExecutionContext,
        log: &dyn LogSink,
    ) -> Result<Option<Retrieval>, RetrieveError> {
        let Some(url) = self.resolve(library, version)? else {
            tracing::debug!(library, "no URL configured, nothing to retrieve");
            return Ok(None);
        };

        let workspace = context.workspace().ok_or_else(|| RetrieveError::NoWorkspace {
            library: library.to_owned(),
            owner: context.owner().to_owned(),
        })?;
        let directory = lease_directory(workspace, &self.workspace_suffix, library);

        let job = Job {
            library,
            version,
            url: &url,
            target,
        };
        let lease = self.leases.acquire(directory).await?;
        let result = self.fetch_and_materialize(lease, &job, context, log).await;

        match &result {
            Ok(retrieval) => tracing::info!(
                library,
                version = retrieval.effective_version(),
                "library retrieved"
            ),
            Err(e) => tracing::debug!(library, error = %e, "library retrieval failed"),
        }
        result.map(Some)
    }

    async fn validate_version(&self, library: &str, version: &str) -> Validation {
        let url = match self.resolve(library, version) {
            Ok(Some(url)) => url,
            Ok(None) => return Validation::cannot_validate("no URL is configured"),
            Err(e) => return Validation::cannot_validate(e),
        };

        let credential = find_credential(
            self.credentials.as_ref(),
            self.config.credentials_id.as_deref(),
            None,
        );
        let auth = Authentication::new(credential.as_ref(), self.config.preemptive_auth);

        let outcome = self.transport.probe(&url, auth).await;
        Validation::from_probe(outcome, version, &url)
    }
}
