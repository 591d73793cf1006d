//! topofix_core — TF.js Layers-Model Topology Normalizer
//!
//! Newer Keras exports serialize two field shapes the TF.js layers loader
//! cannot read: `batch_shape` instead of `batch_input_shape`, and
//! object-form `inbound_nodes` that bury graph connectivity inside
//! `keras_history` call args. This crate rewrites both back into the legacy
//! shapes, in two flavors matching how the fix is deployed:
//!
//! - [`patcher`] — one-shot in-place migration of a `model.json` file, with
//!   a one-time backup of the pristine original.
//! - [`loader`] + [`summary`] — in-memory normalization of topology plus
//!   concatenated weight shards, verified by reconstructing the layer graph
//!   and checking weight accounting.
//!
//! The rewrites themselves live in [`normalize`] and are idempotent and
//! purely local; see that module for the exact trigger conditions.

pub mod error;
pub mod loader;
pub mod normalize;
pub mod patcher;
pub mod summary;
pub mod topology;

pub use error::TopofixError;
pub use loader::{load_for_verification, LoadedModel};
pub use normalize::{normalize_document, normalize_inbound_nodes, PatchCounts};
pub use patcher::{backup_path_for, patch_file, PatchOptions, PatchReport};
pub use summary::{LayerInfo, ModelSummary};
pub use topology::{dtype_width, ModelDescription, WeightSpec, WeightsGroup};
