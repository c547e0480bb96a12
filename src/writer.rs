//! Write-back engine
//!
//! At the end of a run, every cached file flagged dirty is serialized into
//! the output tree; clean files are never touched. One file failing to
//! write does not stop the rest: all failures are collected and surfaced
//! together.

use crate::manager::FileManager;
use crate::{Error, Result};
use std::fs;

/// Outcome of a write-back pass
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Virtual paths written, in cache insertion order
    pub written: Vec<String>,
    /// Virtual paths skipped because they were never modified
    pub skipped: Vec<String>,
    /// Failed writes with their errors
    pub failures: Vec<(String, Error)>,
}

impl WriteReport {
    /// Collapse the report into a result: an error if any write failed.
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::WriteBack(self.failures.len()))
        }
    }
}

/// Write every dirty cached file to its resolved output path.
///
/// Destination directories are created as needed. With
/// [`Settings::test_run`](crate::Settings) set, nothing is written and the
/// report comes back empty.
pub fn write_files(manager: &FileManager) -> WriteReport {
    let mut report = WriteReport::default();

    if manager.settings().test_run {
        log::info!("test run: skipping write-back");
        return report;
    }

    for file in manager.files() {
        let virtual_path = file.virtual_path().to_string();
        if !file.is_dirty() {
            log::debug!("unmodified, not written: {virtual_path}");
            report.skipped.push(virtual_path);
            continue;
        }

        let dest = manager.resolver().output_path(&virtual_path);
        let outcome = dest
            .parent()
            .map(fs::create_dir_all)
            .transpose()
            .map_err(Error::from)
            .and_then(|_| file.write_to(&dest));

        match outcome {
            Ok(()) => {
                log::info!("wrote {virtual_path} to {}", dest.display());
                report.written.push(virtual_path);
            }
            Err(err) => {
                log::error!("failed to write {virtual_path}: {err}");
                report.failures.push((virtual_path, err));
            }
        }
    }

    report
}
