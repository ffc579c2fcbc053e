//! Profile data model.
//!
//! Profiles live on disk as two parallel lists joined by profile name:
//! non-secret settings in `config.json` and key pairs in `credential.json`.
//! In memory they are merged into a single [`Profile`].

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Name of the profile created when migrating a legacy config
pub const DEFAULT_PROFILE: &str = "default";

/// Location of the API server
pub const DEFAULT_BASE_URL: &str = "https://api.ucloud.cn/";

/// Timeout for API requests, in seconds
pub const DEFAULT_TIMEOUT_SEC: u64 = 15;

/// Retry count assumed for settings written before it was configurable
pub const DEFAULT_MAX_RETRY_TIMES: u32 = 3;

/// One element of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    pub project_id: String,
    pub region: String,
    pub zone: String,
    pub base_url: String,
    pub timeout_sec: u64,
    pub profile: String,
    pub active: bool,
    pub max_retry_times: Option<u32>,
}

/// One element of the credential file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialRecord {
    pub public_key: String,
    pub private_key: String,
    pub profile: String,
}

/// Flat single-profile config used before profiles existed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyRecord {
    pub public_key: String,
    pub private_key: String,
    pub region: String,
    pub zone: String,
    pub project_id: String,
}

/// Settings and credential of one profile, joined by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "profile")]
    pub name: String,
    pub active: bool,
    pub project_id: String,
    pub region: String,
    pub zone: String,
    pub base_url: String,
    pub timeout_sec: u64,
    pub public_key: String,
    pub private_key: String,
    pub max_retry_times: u32,
}

impl Profile {
    /// New inactive profile carrying the fixed defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: false,
            project_id: String::new(),
            region: String::new(),
            zone: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            public_key: String::new(),
            private_key: String::new(),
            max_retry_times: DEFAULT_MAX_RETRY_TIMES,
        }
    }

    /// Join a settings record with its credential
    pub fn from_records(settings: SettingsRecord, credential: CredentialRecord) -> Self {
        Self {
            name: settings.profile,
            active: settings.active,
            project_id: settings.project_id,
            region: settings.region,
            zone: settings.zone,
            base_url: settings.base_url,
            timeout_sec: settings.timeout_sec,
            public_key: credential.public_key,
            private_key: credential.private_key,
            max_retry_times: settings.max_retry_times.unwrap_or(DEFAULT_MAX_RETRY_TIMES),
        }
    }

    /// The synthetic active profile seeded from a legacy config
    pub fn from_legacy(legacy: LegacyRecord) -> Self {
        Self {
            active: true,
            project_id: legacy.project_id,
            region: legacy.region,
            zone: legacy.zone,
            public_key: legacy.public_key,
            private_key: legacy.private_key,
            ..Self::new(DEFAULT_PROFILE)
        }
    }

    pub fn settings_record(&self) -> SettingsRecord {
        SettingsRecord {
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            zone: self.zone.clone(),
            base_url: self.base_url.clone(),
            timeout_sec: self.timeout_sec,
            profile: self.name.clone(),
            active: self.active,
            max_retry_times: Some(self.max_retry_times),
        }
    }

    pub fn credential_record(&self) -> CredentialRecord {
        CredentialRecord {
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            profile: self.name.clone(),
        }
    }

    /// Whether both keys have been collected
    pub fn has_keys(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }
}

/// Validate profile name
///
/// Only allows alphanumeric characters, underscores, and hyphens.
pub fn validate_profile_name(name: &str) -> Result<(), ProfileError> {
    let invalid = |reason: &'static str| ProfileError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    if name.chars().count() > 64 {
        return Err(invalid("name cannot be longer than 64 characters"));
    }

    // Allow a-z, A-Z, 0-9, -, _
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(
            "only alphanumeric characters, hyphens (-), and underscores (_) are allowed",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_validation() {
        assert!(validate_profile_name("work").is_ok());
        assert!(validate_profile_name("my-profile").is_ok());
        assert!(validate_profile_name("test_123").is_ok());

        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name("invalid name").is_err());
        assert!(validate_profile_name("test/profile").is_err());
        assert!(validate_profile_name("emoji😊").is_err());
        assert!(validate_profile_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_join_backfills_retry_count() {
        let settings = SettingsRecord {
            profile: "work".to_string(),
            max_retry_times: None,
            ..Default::default()
        };
        let credential = CredentialRecord {
            profile: "work".to_string(),
            public_key: "pk".to_string(),
            private_key: "sk".to_string(),
        };

        let profile = Profile::from_records(settings, credential);
        assert_eq!(profile.max_retry_times, DEFAULT_MAX_RETRY_TIMES);
        assert_eq!(profile.public_key, "pk");
    }

    #[test]
    fn test_records_split_back_out() {
        let mut profile = Profile::new("work");
        profile.region = "cn-bj2".to_string();
        profile.private_key = "sk".to_string();

        let settings = profile.settings_record();
        let credential = profile.credential_record();
        assert_eq!(settings.profile, "work");
        assert_eq!(settings.max_retry_times, Some(DEFAULT_MAX_RETRY_TIMES));
        assert_eq!(credential.private_key, "sk");
        assert_eq!(Profile::from_records(settings, credential), profile);
    }

    #[test]
    fn test_from_legacy() {
        let legacy = LegacyRecord {
            public_key: "pk".to_string(),
            private_key: "sk".to_string(),
            region: "cn-bj2".to_string(),
            zone: "cn-bj2-05".to_string(),
            project_id: "org-x".to_string(),
        };

        let profile = Profile::from_legacy(legacy);
        assert_eq!(profile.name, DEFAULT_PROFILE);
        assert!(profile.active);
        assert_eq!(profile.base_url, DEFAULT_BASE_URL);
        assert_eq!(profile.timeout_sec, DEFAULT_TIMEOUT_SEC);
        assert_eq!(profile.project_id, "org-x");
        assert!(profile.has_keys());
    }

    #[test]
    fn test_profile_serializes_with_profile_key() {
        let json = serde_json::to_value(Profile::new("work")).unwrap();
        assert_eq!(json["profile"], "work");
        assert_eq!(json["max_retry_times"], DEFAULT_MAX_RETRY_TIMES);
    }
}
