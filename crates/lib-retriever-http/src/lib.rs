pub mod auth;
pub mod transport;

pub use auth::basic_auth_header;
pub use transport::{HttpTransport, HttpTransportOptions};

use std::sync::Arc;

use lib_retriever::{CredentialStore, Retriever, RetrieverConfig};

/// A retriever for `config` that downloads over HTTP(S).
pub type HttpRetriever = Retriever<HttpTransport>;

/// Build an [`HttpRetriever`] with a default HTTP client.
pub fn http_retriever(
    config: RetrieverConfig,
    credentials: Arc<dyn CredentialStore>,
) -> HttpRetriever {
    Retriever::new(config, HttpTransport::new(), credentials)
}
