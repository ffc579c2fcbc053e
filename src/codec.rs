//! Reading and writing the on-disk profile files.
//!
//! Both the settings and the credential file hold a JSON array. An empty file
//! is an empty list. Files are always written with owner-only permissions
//! because the credential file holds secret keys.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{FileKind, ProfileError, WriteFailure};
use crate::profile::{CredentialRecord, DEFAULT_MAX_RETRY_TIMES, LegacyRecord, SettingsRecord};

/// Permissions of every file under the configuration directory
pub const LOCAL_FILE_MODE: u32 = 0o600;

/// Read the settings list, backfilling missing retry counts
pub fn read_settings(path: &Path) -> Result<Vec<SettingsRecord>, ProfileError> {
    let mut records: Vec<SettingsRecord> = read_list(path, FileKind::Settings)?;
    for record in &mut records {
        if record.max_retry_times.is_none() {
            record.max_retry_times = Some(DEFAULT_MAX_RETRY_TIMES);
        }
    }
    Ok(records)
}

/// Read the credential list
pub fn read_credentials(path: &Path) -> Result<Vec<CredentialRecord>, ProfileError> {
    read_list(path, FileKind::Credential)
}

pub fn write_settings(path: &Path, records: &[SettingsRecord]) -> Result<(), WriteFailure> {
    write_list(path, records, FileKind::Settings)
}

pub fn write_credentials(path: &Path, records: &[CredentialRecord]) -> Result<(), WriteFailure> {
    write_list(path, records, FileKind::Credential)
}

/// Contents of the legacy location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyFile {
    Missing,
    /// A legacy record. Damaged content is read as an empty one.
    Record(LegacyRecord),
    /// Already a settings list; there is nothing to migrate
    Settings,
}

/// Read the legacy single-profile config.
///
/// The legacy file shares its path with the settings file, so a JSON array
/// there is a current settings list and never a legacy record.
pub fn read_legacy(path: &Path) -> Result<LegacyFile, ProfileError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LegacyFile::Missing),
        Err(source) => {
            return Err(ProfileError::Read {
                kind: FileKind::Legacy,
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(LegacyFile::Record(LegacyRecord::default()));
    }

    let record: Result<LegacyRecord, serde_json::Error> = match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Array(_)) => return Ok(LegacyFile::Settings),
        Ok(value) => serde_json::from_value(value),
        Err(e) => Err(e),
    };
    match record {
        Ok(record) => Ok(LegacyFile::Record(record)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "legacy config is not readable, migrating empty values");
            Ok(LegacyFile::Record(LegacyRecord::default()))
        }
    }
}

fn read_list<T: DeserializeOwned>(path: &Path, kind: FileKind) -> Result<Vec<T>, ProfileError> {
    let content = fs::read_to_string(path).map_err(|source| ProfileError::Read {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|source| ProfileError::Decode {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

fn write_list<T: Serialize>(path: &Path, records: &[T], kind: FileKind) -> Result<(), WriteFailure> {
    let failure = |source: io::Error| WriteFailure {
        kind,
        path: path.to_path_buf(),
        source,
    };

    let content = serde_json::to_string_pretty(records).map_err(|e| failure(e.into()))?;
    write_private_file(path, content.as_bytes()).map_err(failure)
}

/// Write a file atomically with owner-only permissions
///
/// Uses atomic write pattern: write to temp file, then rename.
pub fn write_private_file(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = open_private(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    set_private_permissions(&temp_path)?;

    fs::rename(&temp_path, path)
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(LOCAL_FILE_MODE)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// A stale temp file may have been created with wider permissions.
#[cfg(unix)]
fn set_private_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(LOCAL_FILE_MODE))
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
