//! Model Description and Weights Manifest
//!
//! A TF.js layers model is a JSON document with two top-level sections:
//!
//! ```text
//! {
//!   "modelTopology":   { ... layer graph, nested arbitrarily deep ... },
//!   "weightsManifest": [ { "paths": [...], "weights": [...] }, ... ]
//! }
//! ```
//!
//! The topology stays an untyped `serde_json::Value` tree (the normalizer
//! must tolerate any shape a serializer produced), while the weights
//! manifest is small and regular enough to deserialize into typed structs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TopofixError;

/// One group in `weightsManifest`: the binary shard files holding the data
/// and the ordered specs of the tensors packed into them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsGroup {
    /// Shard file paths, relative to the model JSON file.
    pub paths: Vec<String>,
    /// Tensor specs in pack order.
    pub weights: Vec<WeightSpec>,
}

/// A single named weight tensor within a shard group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSpec {
    pub name: String,
    pub shape: Vec<u64>,
    pub dtype: String,
}

impl WeightSpec {
    /// Number of scalar elements in this tensor.
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Packed byte length of this tensor.
    pub fn byte_len(&self) -> Result<u64, TopofixError> {
        Ok(self.element_count() * dtype_width(&self.dtype)? as u64)
    }
}

/// Byte width of a TF.js weight dtype.
pub fn dtype_width(dtype: &str) -> Result<usize, TopofixError> {
    match dtype {
        "float32" | "int32" => Ok(4),
        "uint8" | "bool" => Ok(1),
        other => Err(TopofixError::UnsupportedDtype(other.to_string())),
    }
}

/// A parsed model document. Thin wrapper over the raw JSON tree with typed
/// access to the sections the patcher and verifier care about.
#[derive(Debug, Clone)]
pub struct ModelDescription {
    pub document: Value,
}

impl ModelDescription {
    pub fn parse(text: &str) -> Result<Self, TopofixError> {
        Ok(Self {
            document: serde_json::from_str(text)?,
        })
    }

    pub fn topology(&self) -> Option<&Value> {
        self.document.get("modelTopology")
    }

    pub fn topology_mut(&mut self) -> Option<&mut Value> {
        self.document.get_mut("modelTopology")
    }

    /// Deserializes `weightsManifest`. A missing section is an empty
    /// manifest, not an error (topology-only files exist in the wild).
    pub fn weights_manifest(&self) -> Result<Vec<WeightsGroup>, TopofixError> {
        match self.document.get("weightsManifest") {
            Some(section) => Ok(serde_json::from_value(section.clone())?),
            None => Ok(Vec::new()),
        }
    }

    /// Compact serialization, the form written back by the patcher.
    pub fn to_compact_json(&self) -> Result<String, TopofixError> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn to_pretty_json(&self) -> Result<String, TopofixError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }
}
