use std::sync::Mutex;

/// A line destined for the build log of the execution that asked for a
/// library.
///
/// The retriever never prints. It hands feedback to a [`LogSink`] and the host
/// decides where it goes (a build console, stderr, a test buffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Info(String),
    Warning(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) => msg,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
        }
    }
}

/// Receives build-log feedback from a retrieval.
pub trait LogSink: Send + Sync {
    fn emit(&self, feedback: Feedback);
}

/// Discards everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _feedback: Feedback) {}
}

/// Buffers feedback in memory, in emission order.
#[derive(Default)]
pub struct CollectingSink {
    items: Mutex<Vec<Feedback>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything emitted so far, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Feedback> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *items)
    }

    pub fn messages(&self) -> Vec<String> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.iter().map(|f| f.message().to_owned()).collect()
    }
}

impl LogSink for CollectingSink {
    fn emit(&self, feedback: Feedback) {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(feedback);
    }
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn emit(&self, feedback: Feedback) {
        (**self).emit(feedback)
    }
}
