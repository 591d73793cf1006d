//! Structural Model Summary
//!
//! The verification path's consumer: proves a normalized description is
//! actually loadable by reconstructing the layer graph and checking the
//! weight accounting, then renders a per-layer table in the style of
//! `model.summary()`.
//!
//! Expects the topology to already be normalized; object-form
//! `inbound_nodes` entries are simply invisible to the graph reconstruction
//! (their layer names sit inside `keras_history`, which only the normalizer
//! understands).

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::error::TopofixError;
use crate::topology::WeightsGroup;

/// One layer row recovered from the topology.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    pub name: String,
    pub class_name: String,
    /// Names of the layers feeding this one, in inbound order.
    pub inbound: Vec<String>,
}

/// Structural summary of a loaded model.
#[derive(Debug)]
pub struct ModelSummary {
    pub model_name: Option<String>,
    pub layers: Vec<LayerInfo>,
    pub tensor_count: usize,
    pub total_params: u64,
    pub total_bytes: u64,
}

impl ModelSummary {
    /// Builds the summary, failing on dangling inbound references or a
    /// weight buffer whose length disagrees with the manifest.
    pub fn build(
        topology: &Value,
        manifest: &[WeightsGroup],
        buffer_len: usize,
    ) -> Result<Self, TopofixError> {
        let layers = collect_layers(topology)?;

        let known: HashSet<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        for layer in &layers {
            for inbound in &layer.inbound {
                if !known.contains(inbound.as_str()) {
                    return Err(TopofixError::UnknownInbound {
                        layer: layer.name.clone(),
                        inbound: inbound.clone(),
                    });
                }
            }
        }

        let mut tensor_count = 0;
        let mut total_params = 0u64;
        let mut total_bytes = 0u64;
        for group in manifest {
            for spec in &group.weights {
                tensor_count += 1;
                total_params += spec.element_count();
                total_bytes += spec.byte_len()?;
            }
        }
        if total_bytes != buffer_len as u64 {
            return Err(TopofixError::WeightLengthMismatch {
                expected: total_bytes as usize,
                actual: buffer_len,
            });
        }

        Ok(Self {
            model_name: model_name(topology),
            layers,
            tensor_count,
            total_params,
            total_bytes,
        })
    }
}

/// The layer list lives at `config.layers`, or one level deeper under a
/// `model_config` wrapper in Keras-exported files.
fn layer_list(topology: &Value) -> Option<&Vec<Value>> {
    topology
        .pointer("/config/layers")
        .or_else(|| topology.pointer("/model_config/config/layers"))
        .and_then(Value::as_array)
}

fn model_name(topology: &Value) -> Option<String> {
    topology
        .pointer("/config/name")
        .or_else(|| topology.pointer("/model_config/config/name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn collect_layers(topology: &Value) -> Result<Vec<LayerInfo>, TopofixError> {
    let entries = layer_list(topology).ok_or(TopofixError::MissingLayers)?;

    let mut layers = Vec::with_capacity(entries.len());
    for entry in entries {
        let class_name = entry
            .get("class_name")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        let name = entry
            .pointer("/config/name")
            .or_else(|| entry.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(&class_name)
            .to_string();
        layers.push(LayerInfo {
            inbound: inbound_names(entry.get("inbound_nodes")),
            name,
            class_name,
        });
    }
    Ok(layers)
}

/// Reads layer names out of legacy-shaped `inbound_nodes`:
/// `[[ [name, node_index, tensor_index, kwargs], ... ], ...]`.
fn inbound_names(inbound_nodes: Option<&Value>) -> Vec<String> {
    let mut names = Vec::new();
    let Some(Value::Array(entries)) = inbound_nodes else {
        return names;
    };
    for entry in entries {
        let Value::Array(tuples) = entry else {
            continue;
        };
        for tuple in tuples {
            if let Some(name) = tuple.get(0).and_then(Value::as_str) {
                names.push(name.to_string());
            }
        }
    }
    names
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.model_name {
            writeln!(f, "Model: {name}")?;
        }
        writeln!(f, "{:<40} {}", "Layer (type)", "Inbound")?;
        writeln!(f, "{}", "=".repeat(64))?;
        for layer in &self.layers {
            let label = format!("{} ({})", layer.name, layer.class_name);
            let inbound = if layer.inbound.is_empty() {
                "-".to_string()
            } else {
                layer.inbound.join(", ")
            };
            writeln!(f, "{label:<40} {inbound}")?;
        }
        writeln!(f, "{}", "=".repeat(64))?;
        writeln!(
            f,
            "Total params: {} ({} bytes in {} tensors)",
            self.total_params, self.total_bytes, self.tensor_count
        )
    }
}
