use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// Environment variable overriding the configuration directory
pub const HOME_ENV: &str = "UCPROF_HOME";

/// All computed paths used by ucprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.ucloud
    pub base_dir: PathBuf,
    /// ~/.ucloud/config.json
    pub settings_file: PathBuf,
    /// ~/.ucloud/credential.json
    pub credential_file: PathBuf,
    /// Single-profile file written by releases before multi-profile support.
    /// It shares its location with the settings file.
    pub legacy_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV) {
            return Ok(Self::from_base_dir(PathBuf::from(dir)));
        }

        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        Ok(Self::from_base_dir(base_dirs.home_dir().join(".ucloud")))
    }

    /// Lay out all files under an explicit configuration directory
    pub fn from_base_dir(base_dir: PathBuf) -> Self {
        let settings_file = base_dir.join("config.json");
        let credential_file = base_dir.join("credential.json");
        let legacy_file = settings_file.clone();

        Self {
            base_dir,
            settings_file,
            credential_file,
            legacy_file,
        }
    }

    /// Where the legacy file is moved once it has been migrated
    pub fn legacy_backup(&self) -> PathBuf {
        let mut name = self.legacy_file.as_os_str().to_owned();
        name.push(".old");
        PathBuf::from(name)
    }

    /// True when both multi-profile files are present on disk
    pub fn store_files_exist(&self) -> bool {
        self.settings_file.is_file() && self.credential_file.is_file()
    }

    /// Ensure the configuration directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create config directory: {:?}", self.base_dir)
        })?;
        Ok(())
    }
}
