use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::RetrieveError;
use crate::lease::Lease;

/// Archive formats a library bundle may be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

impl ArchiveFormat {
    /// Pick the format from the downloaded file name. Anything that is not
    /// recognisably a tarball is treated as zip.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Self::TarGz
        } else if lower.ends_with(".tar") {
            Self::Tar
        } else {
            Self::Zip
        }
    }
}

/// Expand `archive` into `destination`.
///
/// The tree lands exactly as packed: an archive whose content sits under a
/// single top-level directory keeps that directory. Entries that would
/// escape `destination` are rejected.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<(), RetrieveError> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = ArchiveFormat::from_file_name(&file_name);

    std::fs::create_dir_all(destination)
        .map_err(|e| RetrieveError::filesystem(destination, e))?;

    let file = File::open(archive).map_err(|e| RetrieveError::filesystem(archive, e))?;
    let reader = BufReader::new(file);

    let fail = |reason: String| RetrieveError::Extraction {
        path: archive.to_path_buf(),
        reason,
    };

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(reader)
                .map_err(|e| fail(format!("not a readable zip archive: {e}")))?;
            zip.extract(destination).map_err(|e| fail(e.to_string()))
        }
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(reader))
            .unpack(destination)
            .map_err(|e| fail(e.to_string())),
        ArchiveFormat::Tar => tar::Archive::new(reader)
            .unpack(destination)
            .map_err(|e| fail(e.to_string())),
    }
}

/// Expand `archive` into the leased directory, then delete the archive.
pub fn expand_into_lease(lease: &Lease, archive: &Path) -> Result<(), RetrieveError> {
    extract_archive(archive, lease.path())?;
    std::fs::remove_file(archive).map_err(|e| RetrieveError::filesystem(archive, e))?;
    tracing::debug!(archive = %archive.display(), "archive expanded and removed");
    Ok(())
}
