use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use url::Url;

use crate::{
    Authentication, CredentialScope, CredentialStore, ExecutionContext, FetchResult, ProbeOutcome,
    RetrieveError, Transport, UsernamePassword,
};

/// In-memory credential store that remembers every `track` call.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: HashMap<String, (UsernamePassword, CredentialScope)>,
    tracked: Mutex<Vec<(String, String)>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        id: impl Into<String>,
        credential: UsernamePassword,
        scope: CredentialScope,
    ) {
        self.credentials.insert(id.into(), (credential, scope));
    }

    /// `(owner, id)` pairs in the order they were tracked.
    pub fn tracked(&self) -> Vec<(String, String)> {
        self.tracked.lock().unwrap().clone()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_id(&self, id: &str, context: Option<&ExecutionContext>) -> Option<UsernamePassword> {
        let (credential, scope) = self.credentials.get(id)?;
        scope.permits(context).then(|| credential.clone())
    }

    fn track(&self, owner: &str, id: &str) {
        self.tracked
            .lock()
            .unwrap()
            .push((owner.to_owned(), id.to_owned()));
    }
}

/// A canned answer for one URL.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Serve these bytes with 200.
    Archive(Vec<u8>),
    /// Fail the download with this status.
    Status(u16),
    /// Fail without a status.
    Unreachable(String),
}

/// Transport double serving canned responses and logging what it was asked.
///
/// Downloads log `start <destination>` and `end <destination>` around an
/// optional delay, which lets tests observe how retrievals overlap.
#[derive(Default)]
pub struct ScriptedTransport {
    downloads: HashMap<String, Scripted>,
    probes: HashMap<String, ProbeOutcome>,
    delay: Option<Duration>,
    events: Mutex<Vec<String>>,
    auth_seen: Mutex<Vec<(String, bool)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, response: Scripted) -> Self {
        self.downloads.insert(url.to_owned(), response);
        self
    }

    pub fn probe_answer(mut self, url: &str, outcome: ProbeOutcome) -> Self {
        self.probes.insert(url.to_owned(), outcome);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// `(url, credential attached upfront)` for every request made.
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.auth_seen.lock().unwrap().clone()
    }

    fn record(&self, url: &Url, auth: &Authentication<'_>) {
        self.auth_seen
            .lock()
            .unwrap()
            .push((url.to_string(), auth.sends_upfront()));
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn probe(&self, url: &Url, auth: Authentication<'_>) -> ProbeOutcome {
        self.record(url, &auth);
        self.probes
            .get(url.as_str())
            .cloned()
            .unwrap_or(ProbeOutcome::NotFound)
    }

    async fn download(
        &self,
        url: &Url,
        auth: Authentication<'_>,
        destination: &Path,
    ) -> Result<FetchResult, RetrieveError> {
        self.record(url, &auth);
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}", destination.display()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.downloads.get(url.as_str()) {
            Some(Scripted::Archive(bytes)) => {
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| RetrieveError::filesystem(parent, e))?;
                }
                std::fs::write(destination, bytes)
                    .map_err(|e| RetrieveError::filesystem(destination, e))?;
                Ok(FetchResult {
                    archive: destination.to_path_buf(),
                    status: 200,
                })
            }
            Some(Scripted::Status(status)) => Err(RetrieveError::Download {
                url: url.to_string(),
                status: *status,
            }),
            Some(Scripted::Unreachable(cause)) => Err(RetrieveError::Transport {
                url: url.to_string(),
                cause: cause.clone(),
            }),
            None => Err(RetrieveError::Download {
                url: url.to_string(),
                status: 404,
            }),
        };

        self.events
            .lock()
            .unwrap()
            .push(format!("end {}", destination.display()));
        result
    }
}

/// Build a zip archive in memory. Entries ending in `/` become directories.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (path, content) in entries {
        if path.ends_with('/') {
            writer.add_directory(*path, options).unwrap();
        } else {
            writer.start_file(*path, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Build a gzip-compressed tarball in memory.
pub fn tar_gz_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for (path, content) in entries {
        let data = content.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        archive.append(&header, data).unwrap();
    }

    archive.into_inner().unwrap().finish().unwrap()
}

/// The layout of a typical pipeline library, with a version marker.
pub fn library_entries(version: Option<&str>) -> Vec<(&str, &str)> {
    let mut entries = vec![
        ("src/org/example/Util.groovy", "package org.example\nclass Util {}\n"),
        ("vars/hello.groovy", "def call() { echo 'hello' }\n"),
        ("resources/org/example/config.json", "{}\n"),
    ];
    if let Some(version) = version {
        entries.push(("version.txt", version));
    }
    entries
}
