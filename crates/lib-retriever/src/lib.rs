pub mod config;
pub mod context;
pub mod copy;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod lease;
pub mod retriever;
pub mod template;
pub mod transport;
pub mod version;

pub use config::RetrieverConfig;
pub use context::ExecutionContext;
pub use copy::copy_tree;
pub use credentials::{
    CredentialScope, CredentialStore, UsernamePassword, find_credential, lookup_credential,
};
pub use error::RetrieveError;
pub use extract::{ArchiveFormat, expand_into_lease, extract_archive};
pub use feedback::{CollectingSink, Feedback, LogSink, NullSink};
pub use lease::{Lease, LeaseManager, lease_directory, lock_file_path};
pub use retriever::{LibraryRetriever, Retrieval, Retriever, Validation};
pub use template::resolve_url;
pub use transport::{Authentication, FetchResult, ProbeOutcome, Transport, archive_file_name};
pub use version::{VERSION_FILE, read_version_marker};

pub use url::Url;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
