use serde::{Deserialize, Serialize};

/// Persisted settings of an HTTP library retriever.
///
/// Field names follow the stored form (`httpURL`, `credentialsId`,
/// `preemptiveAuth`) so existing configuration loads unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrieverConfig {
    /// URL template of the library archive. May contain
    /// `${library.<name>.version}`.
    #[serde(rename = "httpURL", alias = "url", default)]
    pub http_url: Option<String>,

    #[serde(rename = "credentialsId", default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<String>,

    /// Send Basic credentials on the first request instead of waiting for a
    /// challenge.
    #[serde(rename = "preemptiveAuth", default)]
    pub preemptive_auth: bool,
}

impl RetrieverConfig {
    pub fn new(http_url: impl Into<String>) -> Self {
        Self {
            http_url: Some(http_url.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, id: impl Into<String>) -> Self {
        self.credentials_id = Some(id.into());
        self
    }

    pub fn with_preemptive_auth(mut self, preemptive: bool) -> Self {
        self.preemptive_auth = preemptive;
        self
    }
}
