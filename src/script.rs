//! Script install/remove with compiled-sibling backup
//!
//! The game prefers a compiled `.pck` script over its `.xml` source when
//! both are present, so installing a plain-text override must move any
//! compiled sibling out of the way without destroying it. This operates
//! directly on the scripts directory, outside the load cache: the managed
//! artifacts are not virtual files of the patch pipeline.
//!
//! Per managed script name there are three filesystem states: absent,
//! plain-text active, and compiled-active-with-backup. [`add_script`] and
//! [`remove_script`] move between them; add followed by remove restores
//! the pre-add state exactly, except for the documented conflicting-backup
//! case where restoration is skipped with a warning rather than
//! overwriting data.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the active plain-text script artifact
const SCRIPT_EXT: &str = ".xml";

/// Extension of the compiled sibling artifact
const COMPILED_EXT: &str = ".pck";

/// Suffix appended to a compiled artifact when it is backed up
const BACKUP_SUFFIX: &str = ".x3c.bak";

/// The three artifact paths for one managed script name.
fn artifact_paths(scripts_dir: &Path, script_name: &str) -> (PathBuf, PathBuf, String) {
    let file_name = if script_name.ends_with(SCRIPT_EXT) {
        script_name.to_string()
    } else {
        format!("{script_name}{SCRIPT_EXT}")
    };
    let xml = scripts_dir.join(&file_name);
    let pck = scripts_dir.join(file_name.replace(SCRIPT_EXT, COMPILED_EXT));
    (xml, pck, file_name)
}

fn backup_path(pck: &Path) -> PathBuf {
    let mut name = pck.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Install a known-good script into the scripts directory.
///
/// Copies `<source_dir>/<name>.xml` over any existing text version. If a
/// compiled `.pck` sibling is active, it is renamed to its backup name so
/// it stops shadowing the text form at runtime but stays recoverable.
pub fn add_script(source_dir: &Path, scripts_dir: &Path, script_name: &str) -> Result<()> {
    let (xml, pck, file_name) = artifact_paths(scripts_dir, script_name);

    let source = source_dir.join(&file_name);
    if !source.is_file() {
        return Err(Error::FileNotFound(source.display().to_string()));
    }

    fs::create_dir_all(scripts_dir)?;
    fs::copy(&source, &xml)?;
    log::info!("installed script {file_name}");

    if pck.is_file() {
        let backup = backup_path(&pck);
        fs::rename(&pck, &backup)?;
        log::info!(
            "renamed compiled script {} to {}",
            pck.display(),
            backup.display()
        );
    }

    Ok(())
}

/// Remove a previously installed script, restoring any backed-up compiled
/// sibling.
///
/// If both an active `.pck` and its backup exist, something outside this
/// tool recreated the compiled artifact; restoration is skipped with a
/// warning instead of overwriting it.
pub fn remove_script(scripts_dir: &Path, script_name: &str) -> Result<()> {
    let (xml, pck, file_name) = artifact_paths(scripts_dir, script_name);
    let backup = backup_path(&pck);

    if xml.is_file() {
        fs::remove_file(&xml)?;
        log::info!("removed script {file_name}");
    }

    if backup.is_file() {
        if pck.is_file() {
            log::warn!(
                "both {} and {} exist; backup restoration skipped",
                pck.display(),
                backup.display()
            );
        } else {
            fs::rename(&backup, &pck)?;
            log::info!("restored compiled script {}", pck.display());
        }
    }

    Ok(())
}
