//! One-time adoption of the legacy single-profile config.
//!
//! Releases before multi-profile support kept a single flat record in
//! `config.json` and had no credential file. When the profile files are not
//! both present and `config.json` is not already a settings list, the legacy
//! record (if any) becomes the active `default` profile and the old file is
//! kept next to it with an `.old` suffix.
//!
//! An existing backup is never overwritten, and a failed save moves the
//! legacy file back so the next run starts over.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{self, LegacyFile};
use crate::error::{MigrationError, ProfileError};
use crate::paths::Paths;
use crate::profile::Profile;
use crate::store::{ProfileStore, StoreFiles};

/// Result of a migration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Profile files already exist, or only one of them is missing
    NotNeeded,
    /// A default profile was written. `backup` is where the legacy file was
    /// moved, if there was one.
    Migrated {
        profile: String,
        backup: Option<PathBuf>,
    },
}

/// Migrate the legacy config of `paths` if the profile files do not exist yet
pub fn migrate_legacy(paths: &Paths) -> Result<MigrationOutcome, ProfileError> {
    if paths.store_files_exist() {
        return Ok(MigrationOutcome::NotNeeded);
    }

    let legacy = match codec::read_legacy(&paths.legacy_file)? {
        // A half-present store is left for load to report.
        LegacyFile::Settings => return Ok(MigrationOutcome::NotNeeded),
        LegacyFile::Missing if paths.credential_file.exists() => {
            return Ok(MigrationOutcome::NotNeeded);
        }
        LegacyFile::Missing => None,
        LegacyFile::Record(record) => Some(record),
    };

    let backup = match legacy {
        Some(_) => Some(back_up(&paths.legacy_file, paths.legacy_backup())?),
        None => None,
    };

    let profile = Profile::from_legacy(legacy.unwrap_or_default());
    let name = profile.name.clone();

    let mut store = ProfileStore::empty(StoreFiles::new(paths));
    if let Err(e) = store.append(profile) {
        roll_back(paths, backup.as_deref());
        return Err(MigrationError::Append(Box::new(e)).into());
    }

    info!(profile = %name, backup = ?backup, "migrated legacy config");
    Ok(MigrationOutcome::Migrated {
        profile: name,
        backup,
    })
}

fn back_up(from: &Path, to: PathBuf) -> Result<PathBuf, MigrationError> {
    let rename_error = |source: io::Error| MigrationError::Rename {
        from: from.to_path_buf(),
        to: to.clone(),
        source,
    };

    if fs::symlink_metadata(&to).is_ok() {
        return Err(rename_error(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a previous legacy backup is in the way",
        )));
    }
    fs::rename(from, &to).map_err(rename_error)?;
    Ok(to)
}

/// Undo a failed save so the next run migrates again.
///
/// Neither profile file existed as a regular file before migration, so any
/// that exists now was written by it.
fn roll_back(paths: &Paths, backup: Option<&Path>) {
    if paths.credential_file.is_file() {
        discard(&paths.credential_file);
    }

    match backup {
        Some(backup) => match fs::rename(backup, &paths.legacy_file) {
            Ok(()) => info!(path = %paths.legacy_file.display(), "restored legacy config after failed migration"),
            Err(e) => warn!(
                backup = %backup.display(),
                error = %e,
                "failed to restore legacy config, it is kept at the backup path"
            ),
        },
        None if paths.settings_file.is_file() => discard(&paths.settings_file),
        None => {}
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partly migrated file");
    }
}
