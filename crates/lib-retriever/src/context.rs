use std::path::{Path, PathBuf};

/// The unit of work a retrieval runs on behalf of (a build, a pipeline run).
///
/// The host supplies it; the retriever only reads the owner label (for
/// credential tracking and messages) and the base workspace the lease
/// directory is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    owner: String,
    workspace: Option<PathBuf>,
}

impl ExecutionContext {
    pub fn new(owner: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            owner: owner.into(),
            workspace: Some(workspace.into()),
        }
    }

    /// A context with no workspace, such as a nested or non top-level build.
    /// Retrievals in it fail with [`RetrieveError::NoWorkspace`].
    ///
    /// [`RetrieveError::NoWorkspace`]: crate::RetrieveError::NoWorkspace
    pub fn without_workspace(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            workspace: None,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }
}
