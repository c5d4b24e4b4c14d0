//! Release archives: tar.gz for unix targets, zip for windows
//!
//! Entries carry normalized metadata (fixed mtime, root ownership) so the
//! same binaries always produce byte-identical archives.

use async_compression::tokio::write::GzipEncoder;
use hrel_errors::{BuildError, Error};
use hrel_events::{EventEmitter, Stage};
use hrel_types::{ArchiveKind, Target};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufReader};

use crate::project::ProjectInfo;
use crate::Pipeline;

/// Files copied next to the binary when present in the source root
pub const EXTRA_FILES: [&str; 2] = ["LICENSE", "README.md"];

/// Environment variable for `SOURCE_DATE_EPOCH` (standard for reproducible builds)
const SOURCE_DATE_EPOCH_VAR: &str = "SOURCE_DATE_EPOCH";

/// One file to place in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    /// Path inside the archive
    pub name: String,
    pub mode: u32,
}

impl ArchiveEntry {
    pub fn executable(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            mode: 0o755,
        }
    }

    pub fn regular(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            mode: 0o644,
        }
    }
}

/// Timestamp stamped on every entry
#[must_use]
pub fn deterministic_timestamp() -> u64 {
    std::env::var(SOURCE_DATE_EPOCH_VAR)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Write `entries` to `dest` in the given format
///
/// # Errors
///
/// Returns `BuildError::ArchiveFailed` if a source file cannot be read or the
/// archive cannot be written.
pub async fn create_archive(
    kind: ArchiveKind,
    entries: &[ArchiveEntry],
    dest: &Path,
    timestamp: u64,
) -> Result<(), Error> {
    match kind {
        ArchiveKind::TarGz => create_tar_gz(entries, dest, timestamp).await,
        ArchiveKind::Zip => create_zip(entries, dest, timestamp).await,
    }
}

async fn create_tar_gz(entries: &[ArchiveEntry], dest: &Path, timestamp: u64) -> Result<(), Error> {
    let failed = |message: String| archive_failed(dest, message);

    let tar_file = tempfile::NamedTempFile::new_in(parent_dir(dest))
        .map_err(|e| failed(format!("cannot create temporary tar: {e}")))?;
    let tar_path = tar_file.path().to_path_buf();

    let writer = tar_file
        .reopen()
        .map_err(|e| failed(format!("cannot open temporary tar: {e}")))?;
    let entries_owned = entries.to_vec();
    tokio::task::spawn_blocking(move || write_tar(writer, &entries_owned, timestamp))
        .await
        .map_err(|e| failed(format!("tar creation task failed: {e}")))?
        .map_err(|e| failed(e.to_string()))?;

    let input = tokio::fs::File::open(&tar_path)
        .await
        .map_err(|e| failed(e.to_string()))?;
    let output = tokio::fs::File::create(dest)
        .await
        .map_err(|e| failed(e.to_string()))?;

    let mut encoder = GzipEncoder::new(output);
    let mut reader = BufReader::new(input);
    tokio::io::copy(&mut reader, &mut encoder)
        .await
        .map_err(|e| failed(e.to_string()))?;
    encoder
        .shutdown()
        .await
        .map_err(|e| failed(e.to_string()))?;

    Ok(())
}

fn write_tar(
    writer: std::fs::File,
    entries: &[ArchiveEntry],
    timestamp: u64,
) -> std::io::Result<()> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    for entry in entries {
        let mut file = std::fs::File::open(&entry.source)?;
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(file.metadata()?.len());
        header.set_mode(entry.mode);
        header.set_mtime(timestamp);
        header.set_uid(0);
        header.set_gid(0);
        header.set_username("root")?;
        header.set_groupname("root")?;
        header.set_cksum();
        builder.append_data(&mut header, &entry.name, &mut file)?;
    }

    builder.into_inner()?.sync_all()
}

async fn create_zip(entries: &[ArchiveEntry], dest: &Path, timestamp: u64) -> Result<(), Error> {
    let dest_owned = dest.to_path_buf();
    let entries_owned = entries.to_vec();

    tokio::task::spawn_blocking(move || write_zip(&dest_owned, &entries_owned, timestamp))
        .await
        .map_err(|e| archive_failed(dest, format!("zip creation task failed: {e}")))?
        .map_err(|message| archive_failed(dest, message))
}

fn write_zip(dest: &Path, entries: &[ArchiveEntry], timestamp: u64) -> Result<(), String> {
    use zip::write::SimpleFileOptions;

    let file = std::fs::File::create(dest).map_err(|e| e.to_string())?;
    let mut zip = zip::ZipWriter::new(file);
    let modified = zip_datetime(timestamp);

    for entry in entries {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(entry.mode)
            .last_modified_time(modified);
        zip.start_file(entry.name.as_str(), options)
            .map_err(|e| e.to_string())?;
        let mut source = std::fs::File::open(&entry.source)
            .map_err(|e| format!("{}: {e}", entry.source.display()))?;
        std::io::copy(&mut source, &mut zip).map_err(|e| e.to_string())?;
    }

    zip.finish().map_err(|e| e.to_string())?;
    Ok(())
}

/// Zip timestamps start at 1980; earlier epochs clamp to the minimum
fn zip_datetime(timestamp: u64) -> zip::DateTime {
    use chrono::{DateTime, Datelike, Timelike};

    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .and_then(|time| {
            zip::DateTime::from_date_and_time(
                u16::try_from(time.year()).ok()?,
                u8::try_from(time.month()).ok()?,
                u8::try_from(time.day()).ok()?,
                u8::try_from(time.hour()).ok()?,
                u8::try_from(time.minute()).ok()?,
                u8::try_from(time.second()).ok()?,
            )
            .ok()
        })
        .unwrap_or_default()
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn archive_failed(dest: &Path, message: String) -> Error {
    BuildError::ArchiveFailed {
        archive: dest.display().to_string(),
        message,
    }
    .into()
}

impl Pipeline {
    /// Package every binary in `<dist>/bin` into `<dist>/archive`
    ///
    /// # Errors
    ///
    /// Returns `BuildError::MissingBinary` if a target was not built, or an
    /// archive error if writing fails.
    pub async fn archive(&self, info: &ProjectInfo) -> Result<Vec<PathBuf>, Error> {
        let targets = self.config().targets();
        self.stage(Stage::Archive, &targets, self.package(info, &targets))
            .await
    }

    async fn package(&self, info: &ProjectInfo, targets: &[Target]) -> Result<Vec<PathBuf>, Error> {
        let dist = self.dist_dir();
        let bin_dir = dist.join("bin");
        let archive_dir = dist.join("archive");
        tokio::fs::create_dir_all(&archive_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &archive_dir))?;

        let mut extras = Vec::new();
        for name in EXTRA_FILES {
            let path = self.source_dir().join(name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                extras.push(ArchiveEntry::regular(path, name));
            }
        }

        let names = info.names();
        let timestamp = deterministic_timestamp();
        let mut archives = Vec::with_capacity(targets.len());

        for target in targets {
            let binary = bin_dir.join(names.binary(target));
            if !tokio::fs::try_exists(&binary).await.unwrap_or(false) {
                return Err(BuildError::MissingBinary {
                    path: binary.display().to_string(),
                }
                .into());
            }

            let mut entries = vec![ArchiveEntry::executable(
                binary,
                names.packaged_binary(target),
            )];
            entries.extend(extras.iter().cloned());

            let dest = archive_dir.join(names.archive(target));
            create_archive(ArchiveKind::for_os(target.os), &entries, &dest, timestamp).await?;

            self.emit_artifact(Stage::Archive, Some(*target), &dest);
            archives.push(dest);
        }

        Ok(archives)
    }
}
