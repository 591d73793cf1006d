//! In-Place File Patcher
//!
//! The disk deployment variant: read a model JSON file, normalize the whole
//! document (both rewrites, every mapping), keep a one-time backup of the
//! pristine original, and overwrite the file with the compacted result.
//!
//! The read happens entirely before any write, so a parse failure can never
//! leave a half-written file behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::TopofixError;
use crate::normalize::{normalize_document, PatchCounts};
use crate::topology::ModelDescription;

/// Marker inserted before the file extension to name the backup,
/// `model.json` -> `model.original.json`.
pub const DEFAULT_BACKUP_MARKER: &str = "original";

#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Write a pristine backup before overwriting (first run only).
    pub backup: bool,
    /// Marker used to build the backup filename.
    pub backup_marker: String,
    /// Pretty-print the output instead of compacting it.
    pub pretty: bool,
    /// Normalize and report counts without touching the file.
    pub dry_run: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            backup: true,
            backup_marker: DEFAULT_BACKUP_MARKER.to_string(),
            pretty: false,
            dry_run: false,
        }
    }
}

/// Outcome of one patch run over one file.
#[derive(Debug)]
pub struct PatchReport {
    pub counts: PatchCounts,
    /// Set when this run created the backup; `None` when one already
    /// existed or backups were disabled.
    pub backup_path: Option<PathBuf>,
    pub input_bytes: usize,
    /// Zero on a dry run.
    pub output_bytes: usize,
    pub written: bool,
}

/// Builds the sibling backup path for `path` by inserting `marker` before
/// the extension. Extensionless files get `.{marker}` appended.
pub fn backup_path_for(path: &Path, marker: &str) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => path.with_extension(format!("{marker}.{ext}")),
        None => path.with_extension(marker),
    }
}

/// Patches one model file in place.
///
/// Runs to completion or fails outright; no retries. Intended as a one-shot
/// migration per model artifact, though re-running is safe: the second pass
/// finds nothing to rewrite and the backup is never replaced.
pub fn patch_file(path: &Path, options: &PatchOptions) -> Result<PatchReport, TopofixError> {
    let raw = fs::read_to_string(path)?;
    let mut model = ModelDescription::parse(&raw)?;

    let counts = normalize_document(&mut model.document);
    info!(
        model = %path.display(),
        batch_shape_patched = counts.batch_shape,
        inbound_patched = counts.inbound_nodes,
        "Topology normalized"
    );

    if options.dry_run {
        return Ok(PatchReport {
            counts,
            backup_path: None,
            input_bytes: raw.len(),
            output_bytes: 0,
            written: false,
        });
    }

    let backup_path = if options.backup {
        let backup = backup_path_for(path, &options.backup_marker);
        if backup.exists() {
            info!(backup = %backup.display(), "Backup already present, keeping it");
            None
        } else {
            // The backup holds the pristine pre-patch bytes, never an
            // intermediate patched state.
            fs::write(&backup, &raw)?;
            info!(backup = %backup.display(), "Original saved");
            Some(backup)
        }
    } else {
        None
    };

    let serialized = if options.pretty {
        model.to_pretty_json()?
    } else {
        model.to_compact_json()?
    };
    fs::write(path, &serialized)?;
    info!(
        model = %path.display(),
        input_bytes = raw.len(),
        output_bytes = serialized.len(),
        "Model file rewritten"
    );

    Ok(PatchReport {
        counts,
        backup_path,
        input_bytes: raw.len(),
        output_bytes: serialized.len(),
        written: true,
    })
}
