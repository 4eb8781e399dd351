use std::path::Path;
use std::time::Duration;

use lib_retriever::{
    Authentication, FetchResult, ProbeOutcome, RetrieveError, Transport, Url, UsernamePassword,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use tokio::io::AsyncWriteExt;

use crate::auth::basic_auth_header;

/// Settings for the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    pub connect_timeout: Option<Duration>,
    /// Limit on a whole request, body included.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            timeout: None,
            user_agent: concat!("lib-retriever/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Fetches library archives over HTTP(S) with Basic authentication.
///
/// Without preemptive authentication the first request goes out bare and
/// the credential is only sent in answer to a 401. Servers that hide
/// protected resources behind a 404 therefore need `preemptive` set.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_options(options: &HttpTransportOptions) -> Result<Self, RetrieveError> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            RetrieveError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        credential: Option<&UsernamePassword>,
    ) -> Result<Response, RetrieveError> {
        let mut request = self.client.request(method, url.clone());
        if let Some(credential) = credential {
            let header = basic_auth_header(credential).map_err(|e| {
                RetrieveError::Configuration(format!("unusable credential for {url}: {e}"))
            })?;
            request = request.header(AUTHORIZATION, header);
        }

        request.send().await.map_err(|e| RetrieveError::Transport {
            url: url.to_string(),
            cause: e.to_string(),
        })
    }

    /// One request, plus at most one repeat carrying the credential when the
    /// bare request was challenged with a 401.
    async fn exchange(
        &self,
        method: Method,
        url: &Url,
        auth: Authentication<'_>,
    ) -> Result<Response, RetrieveError> {
        let upfront = auth.sends_upfront();
        let first = self
            .send(method.clone(), url, auth.credential.filter(|_| upfront))
            .await?;
        tracing::debug!(%url, %method, status = first.status().as_u16(), upfront, "first attempt");

        match auth.credential {
            Some(credential) if !upfront && first.status() == StatusCode::UNAUTHORIZED => {
                tracing::debug!(%url, %method, "challenged, retrying with basic authentication");
                self.send(method, url, Some(credential)).await
            }
            _ => Ok(first),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, url: &Url, auth: Authentication<'_>) -> ProbeOutcome {
        match self.exchange(Method::HEAD, url, auth).await {
            Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
            Err(RetrieveError::Transport { cause, .. }) => ProbeOutcome::Unreachable(cause),
            Err(other) => ProbeOutcome::Unreachable(other.to_string()),
        }
    }

    async fn download(
        &self,
        url: &Url,
        auth: Authentication<'_>,
        destination: &Path,
    ) -> Result<FetchResult, RetrieveError> {
        let mut response = self.exchange(Method::GET, url, auth).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RetrieveError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetrieveError::filesystem(parent, e))?;
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| RetrieveError::filesystem(destination, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| RetrieveError::Transport {
            url: url.to_string(),
            cause: format!("failed to read response body: {e}"),
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|e| RetrieveError::filesystem(destination, e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| RetrieveError::filesystem(destination, e))?;

        tracing::debug!(%url, bytes = written, path = %destination.display(), "archive written");
        Ok(FetchResult {
            archive: destination.to_path_buf(),
            status: status.as_u16(),
        })
    }
}
