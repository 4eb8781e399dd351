use crate::context::ExecutionContext;

/// Owner label used when a credential is consumed outside any execution.
pub const SYSTEM_OWNER: &str = "system";

/// Where a stored credential may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScope {
    /// Usable by executions and by administrative checks.
    #[default]
    Global,
    /// Usable only outside an execution context.
    System,
}

impl CredentialScope {
    /// Whether a credential with this scope may be handed to `context`.
    pub fn permits(self, context: Option<&ExecutionContext>) -> bool {
        match self {
            Self::Global => true,
            Self::System => context.is_none(),
        }
    }
}

/// A username and secret ready to be sent as Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct UsernamePassword {
    pub username: String,
    pub secret: String,
}

impl UsernamePassword {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for UsernamePassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsernamePassword")
            .field("username", &self.username)
            .field("secret", &"****")
            .finish()
    }
}

/// The host's credential store.
pub trait CredentialStore: Send + Sync {
    /// Find the username/password credential `id`, as visible from `context`
    /// (`None` for administrative lookups). Returns `None` when the id is
    /// unknown, is not a username/password credential, or is out of scope.
    fn find_by_id(&self, id: &str, context: Option<&ExecutionContext>) -> Option<UsernamePassword>;

    /// Record that `owner` consumed credential `id`.
    fn track(&self, owner: &str, id: &str);
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn find_by_id(&self, id: &str, context: Option<&ExecutionContext>) -> Option<UsernamePassword> {
        (**self).find_by_id(id, context)
    }

    fn track(&self, owner: &str, id: &str) {
        (**self).track(owner, id)
    }
}

/// Resolve the optional credential reference `id` for `context` without
/// reporting its use.
///
/// An absent or empty reference means an anonymous request.
pub fn find_credential(
    store: &dyn CredentialStore,
    id: Option<&str>,
    context: Option<&ExecutionContext>,
) -> Option<UsernamePassword> {
    let id = id.map(str::trim).filter(|id| !id.is_empty())?;

    let credential = store.find_by_id(id, context);
    if credential.is_none() {
        tracing::debug!(credentials_id = id, "credential not resolved, going anonymously");
    }
    credential
}

/// Resolve the optional credential reference `id` for `context` and report
/// the use to the store with [`CredentialStore::track`].
pub fn lookup_credential(
    store: &dyn CredentialStore,
    id: Option<&str>,
    context: Option<&ExecutionContext>,
) -> Option<UsernamePassword> {
    let credential = find_credential(store, id, context)?;

    let owner = context.map_or(SYSTEM_OWNER, ExecutionContext::owner);
    store.track(owner, id.unwrap_or_default().trim());
    Some(credential)
}
