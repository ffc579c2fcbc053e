//! High-level command orchestration for the CLI.
//!
//! This module contains the handler functions for each CLI command (`list`, `add`, `use`, etc.).
//! It serves as the coordination layer, interacting with:
//! - `crate::ui` for output and `inquire` for prompts.
//! - `crate::store` for profile management.
//! - `crate::resolve` for the profile an invocation runs with.
//!
//! Each function here generally corresponds to a subcommand in `main.rs`.

use anyhow::{Context, Result, bail};
use clap::Args;
use inquire::{Confirm, Password, PasswordDisplayMode};

use crate::doctor::run_doctor;
use crate::error::ProfileError;
use crate::mask::{mask_key, masked_profile};
use crate::paths::Paths;
use crate::profile::Profile;
use crate::resolve::{KeyOverride, resolve};
use crate::store::ProfileStore;
use crate::ui::{Status, Ui};

/// Profile fields settable from the command line
#[derive(Debug, Clone, Default, Args)]
pub struct ProfileChanges {
    /// Project id requests are made in
    #[arg(long)]
    pub project_id: Option<String>,

    /// Default region
    #[arg(long)]
    pub region: Option<String>,

    /// Default availability zone
    #[arg(long)]
    pub zone: Option<String>,

    /// API server URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout_sec: Option<u64>,

    /// Retries for failed requests
    #[arg(long)]
    pub max_retry_times: Option<u32>,

    /// Public key (prompted for when missing)
    #[arg(long = "set-public-key", value_name = "KEY")]
    pub public_key: Option<String>,

    /// Private key (prompted for when missing)
    #[arg(long = "set-private-key", value_name = "KEY")]
    pub private_key: Option<String>,

    /// Make this the active profile
    #[arg(long)]
    pub active: bool,
}

impl ProfileChanges {
    pub fn apply(&self, profile: &mut Profile) {
        let set = |field: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *field = value.trim().to_string();
            }
        };
        set(&mut profile.project_id, &self.project_id);
        set(&mut profile.region, &self.region);
        set(&mut profile.zone, &self.zone);
        set(&mut profile.base_url, &self.base_url);
        set(&mut profile.public_key, &self.public_key);
        set(&mut profile.private_key, &self.private_key);

        if let Some(timeout) = self.timeout_sec {
            profile.timeout_sec = timeout;
        }
        if let Some(retries) = self.max_retry_times {
            profile.max_retry_times = retries;
        }
        if self.active {
            profile.active = true;
        }
    }
}

/// Which profile an invocation runs with
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub profile: Option<String>,
    pub keys: KeyOverride,
    pub debug: bool,
}

/// List all profiles with keys masked
pub fn list(store: &ProfileStore, ui: &Ui, json: bool) -> Result<()> {
    if json {
        let profiles: Vec<Profile> = store.profiles().map(masked_profile).collect();
        let out = serde_json::to_string_pretty(&profiles).context("Failed to serialize profiles")?;
        ui.println(out);
        return Ok(());
    }

    if store.is_empty() {
        ui.warn("No profiles found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} add <name>", ui.bold("ucprof")));
        return Ok(());
    }

    ui.section("Profiles");
    ui.println(ui.profile_table(store.profiles()).to_string());
    Ok(())
}

/// Print profile names one per line, for shell completion
pub fn names(store: &ProfileStore, ui: &Ui) -> Result<()> {
    for name in store.names() {
        ui.println(name);
    }
    Ok(())
}

/// Show the profile this invocation resolves to and the client settings derived from it
pub fn current(store: &ProfileStore, ui: &Ui, selection: &Selection, json: bool) -> Result<()> {
    let resolved = resolve(
        store,
        selection.profile.as_deref(),
        &selection.keys,
        selection.debug,
    )?;
    let config = &resolved.config;
    let saved = store.get(&resolved.profile.name).is_some();
    let public_key = mask_key(&resolved.credential.public_key);
    let private_key = mask_key(&resolved.credential.private_key);

    if json {
        let out = serde_json::json!({
            "profile": resolved.profile.name,
            "saved": saved,
            "region": config.region,
            "zone": resolved.profile.zone,
            "project_id": config.project_id,
            "base_url": config.base_url,
            "timeout_sec": config.timeout.as_secs(),
            "user_agent": config.user_agent,
            "max_retry_times": config.max_retries,
            "log_level": config.log_level.to_string(),
            "public_key": public_key,
            "private_key": private_key,
        });
        ui.println(serde_json::to_string_pretty(&out).context("Failed to serialize profile")?);
        return Ok(());
    }

    let name = if saved {
        ui.header_cell(&resolved.profile.name)
    } else {
        ui.highlight(format!("{} (built-in defaults)", resolved.profile.name), Status::Warn)
    };

    ui.section("Current Profile");
    ui.newline();
    let details = ui.details(vec![
        ("Profile", name),
        ("Project", ui.cell(&config.project_id)),
        ("Region", ui.cell(&config.region)),
        ("Zone", ui.cell(&resolved.profile.zone)),
        ("Base URL", ui.cell(&config.base_url)),
        ("Timeout", ui.cell(format!("{}s", config.timeout.as_secs()))),
        ("Retries", ui.cell(config.max_retries.to_string())),
        ("User agent", ui.cell(&config.user_agent)),
        ("Log level", ui.cell(config.log_level.to_string())),
        ("Public key", ui.cell(public_key)),
        ("Private key", ui.cell(private_key)),
    ]);
    ui.println(details.to_string());

    if resolved.credential.public_key.is_empty() || resolved.credential.private_key.is_empty() {
        ui.newline();
        ui.warn("No key pair configured.");
        ui.println(format!(
            "  Run {} to set one.",
            ui.bold(format!("ucprof update {}", resolved.profile.name))
        ));
    }
    Ok(())
}

/// Ask `prompt` for whichever key is still missing
pub fn collect_keys<P>(profile: &mut Profile, prompt: &mut P) -> Result<()>
where
    P: FnMut(&str) -> Result<String>,
{
    if profile.public_key.is_empty() {
        profile.public_key = prompt("Your public key:")?;
    }
    if profile.private_key.is_empty() {
        profile.private_key = prompt("Your private key:")?;
    }
    Ok(())
}

/// Read a key from the terminal without echoing it
pub fn prompt_key(message: &str) -> Result<String> {
    let key = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Key entry cancelled")?;
    Ok(key.trim().to_string())
}

/// Create a new profile, prompting for keys not given as flags
pub fn add<P>(store: &mut ProfileStore, ui: &Ui, name: &str, changes: &ProfileChanges, mut prompt: P) -> Result<()>
where
    P: FnMut(&str) -> Result<String>,
{
    // Checked before prompting for keys.
    if store.get(name).is_some() {
        return Err(explain(ProfileError::DuplicateProfile(name.to_string()), store));
    }

    let mut profile = Profile::new(name);
    changes.apply(&mut profile);
    if !profile.has_keys() {
        collect_keys(&mut profile, &mut prompt)?;
    }

    let active = profile.active;
    saved(store.append(profile), store)?;

    ui.ok(format!("Created profile '{}'", name));
    if !active && store.active_name() == name {
        ui.info("It is the only profile, so it is now active.");
    } else if !active {
        ui.newline();
        ui.println("To activate it:");
        ui.println(format!("  ucprof use {}", name));
    }
    Ok(())
}

/// Change a profile, creating it if it does not exist.
///
/// Keys still missing afterwards are asked for through `prompt`.
pub fn update<P>(store: &mut ProfileStore, ui: &Ui, name: &str, changes: &ProfileChanges, mut prompt: P) -> Result<()>
where
    P: FnMut(&str) -> Result<String>,
{
    let (mut profile, created) = match store.get(name) {
        Some(existing) => (existing.clone(), false),
        None => (Profile::new(name), true),
    };

    changes.apply(&mut profile);
    if !profile.has_keys() {
        collect_keys(&mut profile, &mut prompt)?;
    }
    saved(store.update(profile), store)?;

    if created {
        ui.ok(format!("Created profile '{}'", name));
    } else {
        ui.ok(format!("Updated profile '{}'", name));
    }
    Ok(())
}

/// Make a profile the active one
pub fn use_profile(store: &mut ProfileStore, ui: &Ui, name: &str) -> Result<()> {
    saved(store.switch_active(name), store)?;
    ui.ok(format!("Active profile: {}", name));
    Ok(())
}

/// Delete profiles, asking first unless `yes` is set
pub fn delete(store: &mut ProfileStore, ui: &Ui, names: &[String], yes: bool) -> Result<()> {
    for name in names {
        if store.get(name).is_none() {
            return Err(ProfileError::ProfileNotFound(name.clone()).into());
        }

        if !yes {
            let confirm = Confirm::new(&format!("Delete profile '{}'?", name))
                .with_default(false)
                .prompt()
                .context("Confirmation cancelled")?;
            if !confirm {
                ui.info(format!("Kept profile '{}'", name));
                continue;
            }
        }

        saved(store.delete(name), store)?;
        ui.ok(format!("Deleted profile '{}'", name));
    }
    Ok(())
}

/// Run diagnostics
pub fn doctor(paths: &Paths, ui: &Ui) -> Result<()> {
    if !run_doctor(paths, ui) {
        bail!("Doctor found issues with the ucprof configuration");
    }
    Ok(())
}

fn saved(result: Result<(), ProfileError>, store: &ProfileStore) -> Result<()> {
    result.map_err(|e| explain(e, store))
}

/// Attach a recovery hint to errors the user can act on
fn explain(err: ProfileError, store: &ProfileStore) -> anyhow::Error {
    let hint = match &err {
        ProfileError::Persist(_) => format!(
            "Profile change was not fully saved; {:?} and {:?} may be out of sync.\nHint: Retry the command or inspect the files with 'ucprof doctor'.",
            store.files().settings,
            store.files().credential
        ),
        ProfileError::DuplicateProfile(name) => format!(
            "Cannot create profile '{}'.\nHint: Use 'ucprof update {}' to modify it, or choose a different name.",
            name, name
        ),
        _ => return err.into(),
    };
    anyhow::Error::new(err).context(hint)
}
