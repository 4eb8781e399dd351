use anyhow::Result;
use lib_retriever::LibraryRetriever;

/// Print whether `name` at `version` looks retrievable. Warnings do not fail.
pub async fn run(retriever: &dyn LibraryRetriever, name: &str, version: &str) -> Result<()> {
    let validation = retriever.validate_version(name, version).await;
    if validation.is_ok() {
        println!("{validation}");
    } else {
        eprintln!("{validation}");
    }
    Ok(())
}
