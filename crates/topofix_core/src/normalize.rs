//! Topology Normalization Rewrites
//!
//! Newer Keras serializations emit two field shapes the TF.js layers loader
//! rejects:
//!
//! - `batch_shape` where the loader expects `batch_input_shape`
//! - object-form `inbound_nodes` entries (`{args: [...], kwargs: {...}}`)
//!   where the loader expects the legacy nested-list form
//!   `[[layer_name, node_index, tensor_index, kwargs], ...]`
//!
//! Both rewrites are purely local to the mapping they fire on, so traversal
//! order cannot affect the result, and both are idempotent: on an already
//! normalized tree the `batch_shape` key is gone and every `inbound_nodes`
//! entry is a list, so neither trigger condition matches again.

use serde_json::{Map, Value};

/// How many nodes each rewrite rule touched during one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchCounts {
    /// Mappings where `batch_shape` was renamed to `batch_input_shape`.
    pub batch_shape: usize,
    /// `inbound_nodes` values rebuilt from object form to nested-list form.
    pub inbound_nodes: usize,
}

impl PatchCounts {
    /// True when the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        self.batch_shape == 0 && self.inbound_nodes == 0
    }
}

/// Normalizes a whole model document in place, applying both rewrites to
/// every mapping reachable from `value`.
///
/// This is the file-patch variant's pass: the `batch_shape` rename runs
/// unconditionally across the entire document, not just `modelTopology`.
pub fn normalize_document(value: &mut Value) -> PatchCounts {
    let mut counts = PatchCounts::default();
    walk(value, true, &mut counts);
    counts
}

/// Applies only the `inbound_nodes` rewrite to the given subtree, in place.
///
/// This is the in-memory verification variant's pass. It deliberately does
/// NOT rename `batch_shape`; the two variants diverged this way in
/// production and callers rely on each one's exact behavior.
pub fn normalize_inbound_nodes(value: &mut Value) -> usize {
    let mut counts = PatchCounts::default();
    walk(value, false, &mut counts);
    counts.inbound_nodes
}

/// Depth-first walk over mappings and sequences. Scalars and absent keys
/// are skipped, never errors.
fn walk(value: &mut Value, rename_batch_shape: bool, counts: &mut PatchCounts) {
    match value {
        Value::Object(map) => {
            if rename_batch_shape
                && map.contains_key("batch_shape")
                && !map.contains_key("batch_input_shape")
            {
                if let Some(shape) = map.remove("batch_shape") {
                    map.insert("batch_input_shape".to_string(), shape);
                    counts.batch_shape += 1;
                }
            }

            if let Some(Value::Array(entries)) = map.get_mut("inbound_nodes") {
                if needs_restructure(entries) {
                    let rebuilt = entries.iter().map(rebuild_entry).collect();
                    *entries = rebuilt;
                    counts.inbound_nodes += 1;
                }
            }

            for (_, child) in map.iter_mut() {
                walk(child, rename_batch_shape, counts);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                walk(item, rename_batch_shape, counts);
            }
        }
        _ => {}
    }
}

/// Legacy-shaped `inbound_nodes` contain only sequences; one non-sequence
/// entry means the whole value must be rebuilt.
fn needs_restructure(entries: &[Value]) -> bool {
    entries.iter().any(|entry| !entry.is_array())
}

/// Rebuilds a single `inbound_nodes` entry into the legacy list-of-tuples
/// form. Sequence entries pass through unchanged; object entries yield one
/// `[layer_name, node_index, tensor_index, kwargs]` tuple per arg that
/// carries a valid `config.keras_history`. Args without a history are
/// dropped; an entry with no usable args becomes an empty list.
fn rebuild_entry(entry: &Value) -> Value {
    match entry {
        Value::Array(_) => entry.clone(),
        Value::Object(map) => {
            let kwargs = map
                .get("kwargs")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            let tuples = map
                .get("args")
                .and_then(Value::as_array)
                .map(|args| {
                    args.iter()
                        .filter_map(|arg| history_tuple(arg, &kwargs))
                        .collect()
                })
                .unwrap_or_default();
            Value::Array(tuples)
        }
        _ => Value::Array(Vec::new()),
    }
}

/// Extracts `config.keras_history` = `[layer_name, node_index, tensor_index]`
/// from a call arg and reassembles the legacy 4-tuple. Node and tensor
/// indices default to 0 when the history is short.
fn history_tuple(arg: &Value, kwargs: &Value) -> Option<Value> {
    let history = arg.get("config")?.get("keras_history")?.as_array()?;
    let layer_name = history.first()?.clone();
    let node_index = history.get(1).cloned().unwrap_or_else(|| Value::from(0));
    let tensor_index = history.get(2).cloned().unwrap_or_else(|| Value::from(0));
    Some(Value::Array(vec![
        layer_name,
        node_index,
        tensor_index,
        kwargs.clone(),
    ]))
}
