//! File batch runner: the I/O collaborator around the engine.
//!
//! Owns no transformation logic. Loads each target file, hands its text to
//! a fresh engine invocation, and persists the result when something
//! changed. Files are independent, so the batch runs in parallel with the
//! catalog shared read-only.

use crate::catalog::RuleCatalog;
use crate::engine::RuleEngine;
use crate::report::{BatchSummary, FileResult};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },

    #[error("{} changed on disk while the batch was running; not overwritten", .path.display())]
    ChangedOnDisk { path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-file outcome: either the engine's result or the I/O failure that
/// prevented processing. Errors are contained to their file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Result<FileResult, BatchError>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub reports: Vec<FileReport>,
    pub summary: BatchSummary,
}

pub struct BatchRunner<'c> {
    catalog: &'c RuleCatalog,
    write: bool,
}

impl<'c> BatchRunner<'c> {
    /// `write = false` is a dry run: the engine runs and reports, files
    /// stay untouched.
    pub fn new(catalog: &'c RuleCatalog, write: bool) -> Self {
        Self { catalog, write }
    }

    pub fn run(&self, paths: &[PathBuf]) -> BatchOutcome {
        let mut reports: Vec<FileReport> = paths
            .par_iter()
            .map(|path| self.process(path))
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        let mut summary = BatchSummary::default();
        for report in &reports {
            match &report.outcome {
                Ok(result) => summary.record(result),
                Err(_) => summary.errors += 1,
            }
        }
        BatchOutcome { reports, summary }
    }

    fn process(&self, path: &Path) -> FileReport {
        let outcome = self.process_inner(path);
        FileReport {
            path: path.to_path_buf(),
            outcome,
        }
    }

    fn process_inner(&self, path: &Path) -> Result<FileResult, BatchError> {
        let bytes = fs::read(path).map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = std::str::from_utf8(&bytes).map_err(|_| BatchError::NotUtf8 {
            path: path.to_path_buf(),
        })?;
        let loaded_hash = xxh3_64(&bytes);

        let engine = RuleEngine::new(self.catalog);
        let result = engine.apply(path, text);

        if self.write && result.changed {
            persist(path, &result.final_text, loaded_hash)?;
        }

        Ok(result)
    }
}

/// Write `new_text` to `path`, but only if the file still holds the bytes
/// the engine saw. Atomic: tempfile in the same directory, fsync, rename.
fn persist(path: &Path, new_text: &str, expected_hash: u64) -> Result<(), BatchError> {
    let current = fs::read(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if xxh3_64(&current) != expected_hash {
        return Err(BatchError::ChangedOnDisk {
            path: path.to_path_buf(),
        });
    }

    let write_err = |source: std::io::Error| BatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().ok_or_else(|| {
        write_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(new_text.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    // Touch mtime so incremental builds notice the repair.
    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(write_err)?;

    Ok(())
}
