use std::path::Path;

use anyhow::{Context, Result};
use lib_retriever::{ExecutionContext, LibraryRetriever};

use crate::logging::StderrSink;

/// Retrieve `name` at `version` into `target` and report where it came from.
pub async fn run(
    retriever: &dyn LibraryRetriever,
    name: &str,
    version: &str,
    target: &Path,
    context: &ExecutionContext,
) -> Result<()> {
    let retrieval = retriever
        .retrieve(name, version, target, context, &StderrSink)
        .await
        .with_context(|| format!("failed to retrieve library {name}@{version}"))?;

    match retrieval {
        Some(retrieval) => println!(
            "Retrieved {} {} into {}",
            retrieval.library,
            retrieval.effective_version(),
            retrieval.target.display()
        ),
        None => println!("No URL configured for {name}; nothing retrieved."),
    }

    Ok(())
}
