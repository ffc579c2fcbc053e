//! Picking the profile for an invocation and turning it into API client settings.

use std::fmt;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::error::ProfileError;
use crate::mask::{LOG_PREFIX, LOG_SUFFIX, mask};
use crate::profile::{DEFAULT_PROFILE, Profile};
use crate::store::ProfileStore;

/// User agent sent with every API request
pub fn user_agent() -> String {
    format!("ucprof/{}", env!("CARGO_PKG_VERSION"))
}

/// Select the profile for this invocation.
///
/// An explicit name must exist. Without one the active profile is used; an
/// empty store falls back to an unsaved profile with default settings.
pub fn resolve_profile(store: &ProfileStore, requested: Option<&str>) -> Result<Profile, ProfileError> {
    if let Some(name) = requested {
        return store
            .get(name)
            .cloned()
            .ok_or_else(|| ProfileError::ProfileNotFound(name.to_string()));
    }

    match store.active() {
        Ok(profile) => Ok(profile.clone()),
        Err(ProfileError::NoActiveProfile) if store.is_empty() => {
            tracing::debug!("no profiles configured, using built-in defaults");
            Ok(Profile::new(DEFAULT_PROFILE))
        }
        Err(e) => Err(e),
    }
}

/// Keys supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct KeyOverride {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

/// Key pair used to sign API requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub public_key: String,
    pub private_key: String,
}

impl Credential {
    /// Keys of `profile`, replaced by the override only when both keys are given
    pub fn resolve(profile: &Profile, keys: &KeyOverride) -> Self {
        match (keys.public_key.as_deref(), keys.private_key.as_deref()) {
            (Some(public), Some(private)) if !public.is_empty() && !private.is_empty() => Self {
                public_key: public.to_string(),
                private_key: private.to_string(),
            },
            _ => Self {
                public_key: profile.public_key.clone(),
                private_key: profile.private_key.clone(),
            },
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("public_key", &mask(&self.public_key, LOG_PREFIX, LOG_SUFFIX))
            .field("private_key", &mask(&self.private_key, LOG_PREFIX, LOG_SUFFIX))
            .finish()
    }
}

/// Settings the API client is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub region: String,
    pub project_id: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_retries: u32,
    pub log_level: LevelFilter,
}

impl ClientConfig {
    pub fn from_profile(profile: &Profile, debug: bool) -> Self {
        Self {
            region: profile.region.clone(),
            project_id: profile.project_id.clone(),
            base_url: profile.base_url.clone(),
            timeout: Duration::from_secs(profile.timeout_sec),
            user_agent: user_agent(),
            max_retries: profile.max_retry_times,
            log_level: if debug { LevelFilter::DEBUG } else { LevelFilter::ERROR },
        }
    }
}

/// Everything an API client needs for one invocation
#[derive(Debug, Clone)]
pub struct Resolved {
    pub profile: Profile,
    pub config: ClientConfig,
    pub credential: Credential,
}

/// Resolve the profile and derive the client config and credential from it
pub fn resolve(
    store: &ProfileStore,
    requested: Option<&str>,
    keys: &KeyOverride,
    debug: bool,
) -> Result<Resolved, ProfileError> {
    let profile = resolve_profile(store, requested)?;
    let config = ClientConfig::from_profile(&profile, debug);
    let credential = Credential::resolve(&profile, keys);

    tracing::info!(
        profile = %profile.name,
        region = %config.region,
        project_id = %config.project_id,
        credential = ?credential,
        "loaded profile"
    );
    Ok(Resolved {
        profile,
        config,
        credential,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRY_TIMES, DEFAULT_TIMEOUT_SEC};
    use crate::store::StoreFiles;
    use crate::test_utils::setup_test_paths;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(profiles: &[(&str, bool)]) -> (TempDir, ProfileStore) {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        paths.ensure_dirs().unwrap();
        fs::write(&paths.settings_file, "").unwrap();
        fs::write(&paths.credential_file, "").unwrap();

        let mut store = ProfileStore::load(StoreFiles::new(&paths)).unwrap();
        for (name, active) in profiles {
            let mut profile = Profile::new(*name);
            profile.active = *active;
            profile.region = format!("region-{name}");
            profile.public_key = format!("{name}-public-key");
            profile.private_key = format!("{name}-private-key");
            store.append(profile).unwrap();
        }
        (temp_dir, store)
    }

    #[test]
    fn test_resolves_active_by_default() {
        let (_dir, store) = store_with(&[("a", true), ("b", false)]);
        assert_eq!(resolve_profile(&store, None).unwrap().name, "a");
    }

    #[test]
    fn test_resolves_explicit_name() {
        let (_dir, store) = store_with(&[("a", true), ("b", false)]);
        assert_eq!(resolve_profile(&store, Some("b")).unwrap().name, "b");
        assert!(matches!(
            resolve_profile(&store, Some("zzz")),
            Err(ProfileError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_empty_store_uses_defaults() {
        let (_dir, store) = store_with(&[]);
        let profile = resolve_profile(&store, None).unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE);
        assert_eq!(profile.base_url, DEFAULT_BASE_URL);
        assert_eq!(profile.timeout_sec, DEFAULT_TIMEOUT_SEC);
    }

    #[test]
    fn test_client_config() {
        let (_dir, store) = store_with(&[("a", true)]);
        let profile = resolve_profile(&store, None).unwrap();

        let config = ClientConfig::from_profile(&profile, false);
        assert_eq!(config.region, "region-a");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SEC));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRY_TIMES);
        assert_eq!(config.log_level, LevelFilter::ERROR);
        assert!(config.user_agent.starts_with("ucprof/"));

        assert_eq!(ClientConfig::from_profile(&profile, true).log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn test_key_override_needs_both_keys() {
        let profile = Profile {
            public_key: "stored-pk".to_string(),
            private_key: "stored-sk".to_string(),
            ..Profile::new("a")
        };

        let both = KeyOverride {
            public_key: Some("flag-pk".to_string()),
            private_key: Some("flag-sk".to_string()),
        };
        assert_eq!(Credential::resolve(&profile, &both).public_key, "flag-pk");
        assert_eq!(Credential::resolve(&profile, &both).private_key, "flag-sk");

        let one = KeyOverride {
            public_key: Some("flag-pk".to_string()),
            private_key: None,
        };
        assert_eq!(Credential::resolve(&profile, &one).public_key, "stored-pk");
        assert_eq!(Credential::resolve(&profile, &KeyOverride::default()).private_key, "stored-sk");
    }

    #[test]
    fn test_credential_debug_is_masked() {
        let credential = Credential {
            public_key: "abcdefghijklmnopqrstuvwxyz".to_string(),
            private_key: "0123456789abcdefghij".to_string(),
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("abcdefghijklmnopqrstuvwxyz"));
        assert!(!debug.contains("0123456789abcdefghij"));
        assert!(debug.contains("abcde"));
    }

    #[test]
    fn test_resolve_builds_everything() {
        let (_dir, store) = store_with(&[("a", true), ("b", false)]);
        let resolved = resolve(&store, Some("b"), &KeyOverride::default(), true).unwrap();
        assert_eq!(resolved.profile.name, "b");
        assert_eq!(resolved.config.region, "region-b");
        assert_eq!(resolved.credential.public_key, "b-public-key");
    }
}
