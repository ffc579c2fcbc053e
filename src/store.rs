//! Core profile management logic.
//!
//! [`ProfileStore`] owns every profile of the current configuration directory
//! and which one of them is active. It handles:
//! - Joining the settings and credential files into merged profiles
//! - Creating, updating, activating and removing profiles
//! - Writing both files back after every change
//!
//! Every mutation rewrites both files in full. There is no cross-process
//! locking, so two invocations racing on the same directory can lose writes.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{MigrationError, PersistError, ProfileError};
use crate::migrate::{self, MigrationOutcome};
use crate::paths::Paths;
use crate::profile::{CredentialRecord, Profile, validate_profile_name};

/// The pair of files a store is loaded from and saved to
#[derive(Debug, Clone)]
pub struct StoreFiles {
    pub settings: PathBuf,
    pub credential: PathBuf,
}

impl StoreFiles {
    pub fn new(paths: &Paths) -> Self {
        Self {
            settings: paths.settings_file.clone(),
            credential: paths.credential_file.clone(),
        }
    }
}

/// In-memory collection of profiles keyed by name
#[derive(Debug)]
pub struct ProfileStore {
    files: StoreFiles,
    profiles: BTreeMap<String, Profile>,
    active: Option<String>,
}

impl ProfileStore {
    /// Open the store of a configuration directory.
    ///
    /// When the profile files do not exist yet the legacy single-profile config
    /// is migrated first and the files are loaded once more.
    pub fn open(paths: &Paths) -> Result<Self, ProfileError> {
        let files = StoreFiles::new(paths);

        match migrate::migrate_legacy(paths)? {
            MigrationOutcome::NotNeeded => Self::load(files),
            MigrationOutcome::Migrated { .. } => Self::load(files)
                .map_err(|e| ProfileError::from(MigrationError::Reload(Box::new(e)))),
        }
    }

    /// Store with no profiles, bound to `files`. Nothing is read or written.
    pub fn empty(files: StoreFiles) -> Self {
        Self {
            files,
            profiles: BTreeMap::new(),
            active: None,
        }
    }

    /// Load and join both files.
    ///
    /// A settings record whose credential is missing is skipped with a warning,
    /// unless it is the active one, which fails the load.
    pub fn load(files: StoreFiles) -> Result<Self, ProfileError> {
        let settings = codec::read_settings(&files.settings)?;
        let credentials = codec::read_credentials(&files.credential)?;
        let has_settings = !settings.is_empty();

        let credentials: HashMap<String, CredentialRecord> = credentials
            .into_iter()
            .map(|c| (c.profile.clone(), c))
            .collect();

        let mut store = Self::empty(files);
        for mut record in settings {
            if record.profile.is_empty() {
                warn!("skipping settings record without a profile name");
                continue;
            }
            if store.profiles.contains_key(&record.profile) {
                warn!(profile = %record.profile, "duplicate settings record, keeping the first one");
                continue;
            }

            if record.active {
                match &store.active {
                    None => store.active = Some(record.profile.clone()),
                    Some(current) => {
                        warn!(profile = %record.profile, active = %current, "more than one active profile, deactivating");
                        record.active = false;
                    }
                }
            }

            let Some(credential) = credentials.get(&record.profile) else {
                warn!(profile = %record.profile, "profile has no credential, skipping");
                continue;
            };

            let profile = Profile::from_records(record, credential.clone());
            store.profiles.insert(profile.name.clone(), profile);
        }

        match &store.active {
            None if has_settings => return Err(ProfileError::NoActiveProfile),
            Some(name) if !store.profiles.contains_key(name) => {
                return Err(ProfileError::MissingCredential(name.clone()));
            }
            _ => {}
        }

        debug!(
            profiles = store.profiles.len(),
            active = store.active_name(),
            "loaded profiles"
        );
        Ok(store)
    }

    pub fn files(&self) -> &StoreFiles {
        &self.files
    }

    /// Insert a new profile and save
    pub fn append(&mut self, mut profile: Profile) -> Result<(), ProfileError> {
        validate_profile_name(&profile.name)?;
        if self.profiles.contains_key(&profile.name) {
            return Err(ProfileError::DuplicateProfile(profile.name));
        }

        self.hand_off_active(&mut profile);
        info!(profile = %profile.name, active = profile.active, "adding profile");
        self.profiles.insert(profile.name.clone(), profile);
        self.persist()
    }

    /// Replace a profile by name and save, inserting it if it does not exist
    pub fn update(&mut self, mut profile: Profile) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(&profile.name) {
            return self.append(profile);
        }

        self.hand_off_active(&mut profile);
        info!(profile = %profile.name, active = profile.active, "updating profile");
        self.profiles.insert(profile.name.clone(), profile);
        self.persist()
    }

    /// Make an existing profile the active one and save
    pub fn switch_active(&mut self, name: &str) -> Result<(), ProfileError> {
        let Some(profile) = self.profiles.get(name) else {
            return Err(ProfileError::ProfileNotFound(name.to_string()));
        };
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }

        let mut profile = profile.clone();
        profile.active = true;
        self.update(profile)
    }

    /// Remove an inactive profile and save
    pub fn delete(&mut self, name: &str) -> Result<(), ProfileError> {
        let Some(profile) = self.profiles.get(name) else {
            return Err(ProfileError::ProfileNotFound(name.to_string()));
        };
        if profile.active || self.active.as_deref() == Some(name) {
            return Err(ProfileError::CannotDeleteActive(name.to_string()));
        }

        self.profiles.remove(name);
        info!(profile = %name, "deleted profile");
        self.persist()
    }

    /// Profile names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// All profiles in name order. Keys are not masked.
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn active(&self) -> Result<&Profile, ProfileError> {
        self.active
            .as_deref()
            .and_then(|name| self.profiles.get(name))
            .ok_or(ProfileError::NoActiveProfile)
    }

    /// Name of the active profile, or "" when there is none
    pub fn active_name(&self) -> &str {
        match self.active() {
            Ok(profile) => &profile.name,
            Err(_) => "",
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Rewrite both files from memory.
    ///
    /// Both writes are always attempted; failures of either are reported together.
    pub fn persist(&self) -> Result<(), ProfileError> {
        let settings: Vec<_> = self.profiles.values().map(Profile::settings_record).collect();
        let credentials: Vec<_> = self
            .profiles
            .values()
            .map(Profile::credential_record)
            .collect();

        let settings_written = codec::write_settings(&self.files.settings, &settings);
        let credentials_written = codec::write_credentials(&self.files.credential, &credentials);

        PersistError::check(settings_written, credentials_written)?;
        debug!(profiles = self.profiles.len(), "saved profiles");
        Ok(())
    }

    /// Keep a single active profile across an insert of `incoming`.
    ///
    /// The first profile of an empty store is always active, and the active
    /// profile cannot be switched off by updating it.
    fn hand_off_active(&mut self, incoming: &mut Profile) {
        match self.active.clone() {
            None => {
                if !incoming.active {
                    debug!(profile = %incoming.name, "no active profile, activating");
                    incoming.active = true;
                }
                self.active = Some(incoming.name.clone());
            }
            Some(current) if current == incoming.name => {
                if !incoming.active {
                    warn!(profile = %incoming.name, "active profile stays active, activate another profile instead");
                    incoming.active = true;
                }
            }
            Some(current) => {
                if incoming.active {
                    if let Some(previous) = self.profiles.get_mut(&current) {
                        previous.active = false;
                    }
                    info!(from = %current, to = %incoming.name, "switching active profile");
                    self.active = Some(incoming.name.clone());
                }
            }
        }
    }
}
