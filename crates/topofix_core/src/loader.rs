//! In-Memory Loader
//!
//! The verification deployment variant: read the model file plus every
//! weight shard the manifest names, concatenate the shard bytes into one
//! buffer, and normalize the topology in memory only. Nothing is written
//! back to disk.
//!
//! This path applies only the `inbound_nodes` rewrite, mirroring how the
//! two variants diverged in production; the on-disk patcher is the one that
//! also renames `batch_shape`.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::TopofixError;
use crate::normalize::normalize_inbound_nodes;
use crate::topology::{ModelDescription, WeightsGroup};

/// A model read from disk with its topology normalized and its weight
/// shards concatenated, ready to hand to a structural verifier.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: ModelDescription,
    pub manifest: Vec<WeightsGroup>,
    /// All shard bytes, concatenated in manifest order.
    pub weights: Vec<u8>,
    /// How many `inbound_nodes` values the in-memory pass rewrote.
    pub inbound_patched: usize,
}

/// Reads `model_path` and its weight shards, normalizing `inbound_nodes`
/// inside `modelTopology` in memory.
///
/// Shard paths resolve relative to the model file's directory. A missing
/// `modelTopology` section is fatal here (unlike in the patcher, which
/// happily walks whatever document it is given): there is nothing to
/// verify without one.
pub fn load_for_verification(model_path: &Path) -> Result<LoadedModel, TopofixError> {
    let raw = fs::read_to_string(model_path)?;
    let mut model = ModelDescription::parse(&raw)?;

    let topology = model
        .topology_mut()
        .ok_or(TopofixError::MissingTopology)?;
    let inbound_patched = normalize_inbound_nodes(topology);
    info!(
        model = %model_path.display(),
        inbound_patched,
        "Topology normalized in memory"
    );

    let manifest = model.weights_manifest()?;
    let base = model_path.parent().unwrap_or_else(|| Path::new("."));

    let mut weights = Vec::new();
    for group in &manifest {
        for shard in &group.paths {
            let shard_path = base.join(shard);
            let bytes = fs::read(&shard_path).map_err(|source| TopofixError::ShardRead {
                path: shard_path.display().to_string(),
                source,
            })?;
            debug!(shard = %shard_path.display(), bytes = bytes.len(), "Shard loaded");
            weights.extend_from_slice(&bytes);
        }
    }
    info!(
        shards = manifest.iter().map(|g| g.paths.len()).sum::<usize>(),
        weight_bytes = weights.len(),
        "Weight buffer assembled"
    );

    Ok(LoadedModel {
        model,
        manifest,
        weights,
        inbound_patched,
    })
}
