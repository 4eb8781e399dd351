use lib_retriever::{CredentialStore, ExecutionContext, UsernamePassword};

use crate::config::CredentialEntry;

/// Credential store backed by the `[[credentials]]` section of the config.
pub struct ConfigCredentialStore {
    entries: Vec<CredentialEntry>,
}

impl ConfigCredentialStore {
    pub fn new(entries: Vec<CredentialEntry>) -> Self {
        Self { entries }
    }

    fn secret_of(entry: &CredentialEntry) -> Option<String> {
        if let Some(password) = &entry.password {
            return Some(password.clone());
        }
        let var = entry.password_env.as_deref()?;
        match std::env::var(var) {
            Ok(secret) => Some(secret),
            Err(e) => {
                tracing::warn!(credentials_id = %entry.id, env = var, "password unavailable: {e}");
                None
            }
        }
    }
}

impl CredentialStore for ConfigCredentialStore {
    fn find_by_id(&self, id: &str, context: Option<&ExecutionContext>) -> Option<UsernamePassword> {
        let entry = self.entries.iter().find(|e| e.id == id)?;
        if !entry.scope.permits(context) {
            tracing::debug!(credentials_id = id, "credential not in scope for this execution");
            return None;
        }
        let secret = Self::secret_of(entry)?;
        Some(UsernamePassword::new(entry.username.clone(), secret))
    }

    fn track(&self, owner: &str, id: &str) {
        tracing::info!(owner, credentials_id = id, "credential used");
    }
}
