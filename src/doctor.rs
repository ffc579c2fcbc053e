//! Diagnostic tool for ucprof.
//!
//! This module implements the `ucprof doctor` command, which checks the
//! configuration directory for common issues:
//! - Existence of the directory and both profile files.
//! - Owner-only permissions on files holding keys.
//! - Whether the files decode.
//! - Exactly one active profile and no settings without credentials.
//!
//! It reads the files directly rather than through the store, so it still
//! works when the store refuses to load.

use std::collections::HashSet;
use std::env;
use std::path::Path;

use crate::codec;
use crate::paths::{HOME_ENV, Paths};
use crate::profile::{CredentialRecord, SettingsRecord};
use crate::ui::{Status, Ui};

/// Findings about the joined settings and credential records
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecordReport {
    /// Profiles flagged active, in file order
    pub active: Vec<String>,
    /// Settings without a credential; these are dropped on load
    pub orphaned: Vec<String>,
    /// Credentials no settings record refers to
    pub unused_credentials: Vec<String>,
    /// Profiles with an empty public or private key
    pub missing_keys: Vec<String>,
}

impl RecordReport {
    pub fn inspect(settings: &[SettingsRecord], credentials: &[CredentialRecord]) -> Self {
        let setting_names: HashSet<&str> = settings.iter().map(|s| s.profile.as_str()).collect();
        let credential_names: HashSet<&str> =
            credentials.iter().map(|c| c.profile.as_str()).collect();

        let mut report = Self::default();
        for record in settings {
            if record.active {
                report.active.push(record.profile.clone());
            }
            if !credential_names.contains(record.profile.as_str()) {
                report.orphaned.push(record.profile.clone());
            }
        }
        for credential in credentials {
            if !setting_names.contains(credential.profile.as_str()) {
                report.unused_credentials.push(credential.profile.clone());
            } else if credential.public_key.is_empty() || credential.private_key.is_empty() {
                report.missing_keys.push(credential.profile.clone());
            }
        }
        report
    }

    /// Whether the store would load these records
    pub fn loads(&self) -> bool {
        match self.active.first() {
            Some(active) => !self.orphaned.contains(active),
            None => false,
        }
    }
}

/// Run the doctor diagnostics, returning whether every check passed
pub fn run_doctor(paths: &Paths, ui: &Ui) -> bool {
    ui.section("ucprof Doctor");
    ui.newline();

    let mut healthy = true;

    // 1. Check directory
    healthy &= check_step(ui, "Directory", || {
        if paths.base_dir.is_dir() {
            ui.finding(
                Status::Ok,
                format!("Config directory exists: {}", paths.base_dir.display()),
            );
            true
        } else {
            ui.finding(
                Status::Warn,
                format!("Config directory missing: {} (created on first run)", paths.base_dir.display()),
            );
            true
        }
    });

    // 2. Check files
    let mut settings = None;
    let mut credentials = None;
    healthy &= check_step(ui, "Profile Files", || {
        let mut ok = true;
        ok &= check_file(ui, "Settings", &paths.settings_file);
        ok &= check_file(ui, "Credential", &paths.credential_file);

        if paths.settings_file.is_file() {
            match codec::read_settings(&paths.settings_file) {
                Ok(records) => settings = Some(records),
                Err(e) => {
                    ui.finding(Status::Fail, e.to_string());
                    ok = false;
                }
            }
        }
        if paths.credential_file.is_file() {
            match codec::read_credentials(&paths.credential_file) {
                Ok(records) => credentials = Some(records),
                Err(e) => {
                    ui.finding(Status::Fail, e.to_string());
                    ok = false;
                }
            }
        }

        if paths.legacy_backup().exists() {
            ui.finding(
                Status::Info,
                format!("Migrated legacy config kept at {}", paths.legacy_backup().display()),
            );
        }
        ok
    });

    // 3. Check profiles
    healthy &= check_step(ui, "Profiles", || {
        let (Some(settings), Some(credentials)) = (&settings, &credentials) else {
            ui.finding(Status::Warn, "Skipped, profile files unreadable");
            return true;
        };

        if settings.is_empty() {
            ui.finding(Status::Warn, "No profiles configured");
            return true;
        }

        let report = RecordReport::inspect(settings, credentials);
        ui.println(format!("  Found {} profiles", settings.len()));

        match report.active.as_slice() {
            [] => ui.finding(
                Status::Fail,
                format!(
                    "No active profile; set \"active\": true on one profile in {}",
                    paths.settings_file.display()
                ),
            ),
            [one] => ui.finding(Status::Ok, format!("Active profile: {}", one)),
            many => ui.finding(
                Status::Warn,
                format!("Several active profiles: {} (the first one wins)", many.join(", ")),
            ),
        }
        for name in &report.orphaned {
            ui.finding(
                Status::Fail,
                format!(
                    "{} has no credential; add its keys to {} or remove it from {}",
                    name,
                    paths.credential_file.display(),
                    paths.settings_file.display()
                ),
            );
        }
        for name in &report.unused_credentials {
            ui.finding(Status::Warn, format!("Credential of unknown profile {}", name));
        }
        for name in &report.missing_keys {
            ui.finding(Status::Warn, format!("{} has no key pair", name));
        }

        report.loads() && report.orphaned.is_empty()
    });

    // 4. Environment
    check_step(ui, "Environment", || {
        match env::var(HOME_ENV) {
            Ok(dir) => ui.finding(Status::Info, format!("{} set to: {}", HOME_ENV, dir)),
            Err(_) => ui.finding(Status::Info, format!("{} not set (using ~/.ucloud)", HOME_ENV)),
        }
        true
    });

    healthy
}

fn check_file(ui: &Ui, label: &str, path: &Path) -> bool {
    if !path.exists() {
        ui.finding(Status::Warn, format!("{} file missing: {}", label, path.display()));
        return true;
    }
    if !path.is_file() {
        ui.finding(Status::Fail, format!("{} path is not a file: {}", label, path.display()));
        return false;
    }

    ui.finding(Status::Ok, format!("{} file exists: {}", label, path.display()));
    check_permissions(ui, path)
}

#[cfg(unix)]
fn check_permissions(ui: &Ui, path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o777;
            if mode & 0o077 == 0 {
                true
            } else {
                ui.finding(
                    Status::Fail,
                    format!(
                        "{} is readable by others (mode {:o}, expected {:o})",
                        path.display(),
                        mode,
                        codec::LOCAL_FILE_MODE
                    ),
                );
                false
            }
        }
        Err(e) => {
            ui.finding(Status::Fail, format!("Cannot stat {}: {}", path.display(), e));
            false
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_ui: &Ui, _path: &Path) -> bool {
    true
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F) -> bool
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.paint(Status::Fail, "  Issues detected!"));
    }
    ui.newline();
    success
}
