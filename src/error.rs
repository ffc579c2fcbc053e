//! Error types for the profile store and its on-disk codec.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which backing file an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Settings,
    Credential,
    Legacy,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Settings => f.write_str("settings"),
            FileKind::Credential => f.write_str("credential"),
            FileKind::Legacy => f.write_str("legacy config"),
        }
    }
}

/// Errors raised while loading, mutating or saving profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to read {kind} file {path:?}: {source}")]
    Read {
        kind: FileKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {kind} file {path:?}: {source}")]
    Decode {
        kind: FileKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "No active profile found.\nHint: Run 'ucprof doctor', then set \"active\": true on one profile in config.json."
    )]
    NoActiveProfile,

    #[error(
        "Active profile '{0}' has no credential. When several profiles in config.json are marked active, the first one is used.\nHint: Run 'ucprof doctor', then add its keys to credential.json or mark another profile active in config.json."
    )]
    MissingCredential(String),

    #[error("Profile '{0}' already exists")]
    DuplicateProfile(String),

    #[error("Profile '{0}' does not exist.\nHint: Use 'ucprof list' to see available profiles.")]
    ProfileNotFound(String),

    #[error("Cannot delete active profile '{0}'.\nHint: Activate another profile with 'ucprof use <name>' first.")]
    CannotDeleteActive(String),

    #[error("Invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// A single failed file write
#[derive(Debug)]
pub struct WriteFailure {
    pub kind: FileKind,
    pub path: PathBuf,
    pub source: io::Error,
}

/// Failure to write one or both backing files.
///
/// In-memory state is left as mutated; disk and memory have diverged.
#[derive(Debug)]
pub struct PersistError {
    failures: Vec<WriteFailure>,
}

impl PersistError {
    /// Combine the outcome of both writes, failing if either failed
    pub fn check(settings: Result<(), WriteFailure>, credential: Result<(), WriteFailure>) -> Result<(), Self> {
        let failures: Vec<WriteFailure> = [settings, credential]
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self { failures })
        }
    }

    pub fn failures(&self) -> &[WriteFailure] {
        &self.failures
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|w| format!("save {} file {:?} failed: {}", w.kind, w.path, w.source))
            .collect();
        write!(f, "{}", parts.join(" | "))
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|w| &w.source as &(dyn std::error::Error + 'static))
    }
}

/// Failure while adopting the legacy single-profile file
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to move legacy config {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to save migrated profile: {0}")]
    Append(#[source] Box<ProfileError>),

    #[error("Failed to reload profiles after migration: {0}")]
    Reload(#[source] Box<ProfileError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FileKind) -> WriteFailure {
        WriteFailure {
            kind,
            path: PathBuf::from(format!("/x/{kind}.json")),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    #[test]
    fn test_persist_ok_when_both_succeed() {
        assert!(PersistError::check(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn test_persist_reports_both_failures() {
        let err = PersistError::check(Err(failure(FileKind::Settings)), Err(failure(FileKind::Credential)))
            .unwrap_err();
        assert_eq!(err.failures().len(), 2);

        let msg = err.to_string();
        assert!(msg.contains("save settings file"));
        assert!(msg.contains("save credential file"));
        assert!(msg.contains(" | "));
    }

    #[test]
    fn test_persist_single_failure() {
        let err = PersistError::check(Ok(()), Err(failure(FileKind::Credential))).unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].kind, FileKind::Credential);
        assert!(!err.to_string().contains("settings"));
    }

    #[test]
    fn test_inconsistent_store_hints_point_at_doctor() {
        for err in [ProfileError::NoActiveProfile, ProfileError::MissingCredential("a".to_string())] {
            let msg = err.to_string();
            assert!(msg.contains("ucprof doctor"), "{msg}");
            assert!(!msg.contains("ucprof list"), "{msg}");
        }

        let msg = ProfileError::MissingCredential("a".to_string()).to_string();
        assert!(msg.contains("credential.json"));
        assert!(msg.contains("first one is used"));
    }
}
