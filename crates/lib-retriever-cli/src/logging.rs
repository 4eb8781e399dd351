use lib_retriever::{Feedback, LogSink};
use tracing_subscriber::EnvFilter;

/// Initialize diagnostic logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` decides how chatty the
/// retriever crates are.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,lib_retriever=debug,lib_retriever_http=debug,lib_retriever_cli=debug"
    } else {
        "warn,lib_retriever=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build-log sink that prints feedback to stderr.
pub struct StderrSink;

impl LogSink for StderrSink {
    fn emit(&self, feedback: Feedback) {
        eprintln!("{feedback}");
    }
}
