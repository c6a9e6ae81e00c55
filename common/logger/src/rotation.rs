//! Size based rotation of the file sink.

use crate::LoggerError;
use chrono::{DateTime, Duration, Utc};
use logroller::{Compression, LogRoller, LogRollerBuilder, Rotation, RotationSize};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_SIZE_KB: u64 = 1024 * 1024;
pub const DEFAULT_MAX_BACKUPS: u64 = 5;
pub const DEFAULT_MAX_AGE_DAYS: u64 = 28;

/// Defines when the file sink rotates and which rotated files are retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Size in kilobytes after which the current file is rotated (1024 MB by default).
    pub max_size_kb: u64,

    /// Maximum number of rotated files to keep.
    pub max_backups: u64,

    /// Rotated files older than this are removed. 0 keeps them regardless of their age.
    pub max_age_days: u64,

    /// Whether rotated files are gzip compressed.
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_kb: DEFAULT_MAX_SIZE_KB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            compress: true,
        }
    }
}

impl RotationPolicy {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kb.saturating_mul(1024)
    }
}

/// A file writer that rotates by size and prunes rotated files by count and age.
pub struct RotatingFile {
    roller: LogRoller,
    directory: PathBuf,
    file_name: String,
    policy: RotationPolicy,
    written: u64,
}

impl RotatingFile {
    pub fn open(file_path: &str, policy: RotationPolicy) -> Result<Self, LoggerError> {
        let (directory, file_name) = split_file_path(file_path)?;
        fs::create_dir_all(&directory)?;

        let directory_name = directory.to_string_lossy().into_owned();
        let mut builder = LogRollerBuilder::new(directory_name.as_str(), file_name.as_str())
            .rotation(Rotation::SizeBased(RotationSize::KB(policy.max_size_kb)))
            .max_keep_files(policy.max_backups);
        if policy.compress {
            builder = builder.compression(Compression::Gzip);
        }
        let roller = builder.build().map_err(|err| LoggerError::LoggerConfigurationError {
            message: format!("Cannot open the log file [{}]. err: {:?}", file_path, err),
        })?;

        let written = fs::metadata(directory.join(&file_name)).map(|meta| meta.len()).unwrap_or(0);

        let rotating_file = Self { roller, directory, file_name, policy, written };
        rotating_file.prune()?;
        Ok(rotating_file)
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    fn prune(&self) -> io::Result<usize> {
        prune_expired_backups(&self.directory, &self.file_name, self.policy.max_age_days)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = self.roller.write(buf)?;
        self.written += len as u64;
        if self.written >= self.policy.max_size_bytes() {
            self.written = 0;
            // This writer runs inside the logging pipeline, so it cannot log through it.
            if let Err(err) = self.prune() {
                eprintln!(
                    "Cannot prune the rotated files of [{}]. err: {:?}",
                    self.path().display(),
                    err
                );
            }
        }
        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.roller.flush()
    }
}

/// Removes the rotated files of `file_name` whose last modification is older than `max_age_days`.
/// Returns the number of removed files.
pub fn prune_expired_backups(
    directory: &Path,
    file_name: &str,
    max_age_days: u64,
) -> io::Result<usize> {
    if max_age_days == 0 {
        return Ok(0);
    }
    let cutoff = Utc::now() - Duration::days(max_age_days as i64);
    let prefix = format!("{}.", file_name);

    let mut removed = 0;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let is_backup = entry.file_name().to_str().map_or(false, |name| {
            name.starts_with(&prefix) && !name.contains(PENDING_MARKER)
        });
        if is_backup && remove_if_expired(&entry.path(), cutoff)? {
            removed += 1;
        }
    }
    Ok(removed)
}

// logroller moves rotated files through `<file>.pending.<n>` names on a background thread.
const PENDING_MARKER: &str = ".pending.";

/// Removes the file if it was last modified before `cutoff`.
/// A file that disappears in the meantime is not an error.
fn remove_if_expired(path: &Path, cutoff: DateTime<Utc>) -> io::Result<bool> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if !metadata.is_file() {
        return Ok(false);
    }
    let modified: DateTime<Utc> = metadata.modified()?.into();
    if modified >= cutoff {
        return Ok(false);
    }
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Splits a file path into its directory and its file name.
/// A bare file name is placed in the current directory.
fn split_file_path(file_path: &str) -> Result<(PathBuf, String), LoggerError> {
    let full_path = file_path.replace(r#"\"#, "/");
    let path = Path::new(&full_path);

    let file_name = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) if !full_path.ends_with('/') => name.to_owned(),
        _ => {
            return Err(LoggerError::LoggerConfigurationError {
                message: format!("Output file format [{}] is wrong", file_path),
            })
        }
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((directory, file_name))
}
