use thiserror::Error;

/// Errors produced while patching or verifying a model description.
///
/// Traversal anomalies inside the topology (unexpected shapes, absent keys)
/// are never errors; they simply mean a rewrite rule does not apply. Only
/// I/O, parse, and structural-verification failures surface here.
#[derive(Debug, Error)]
pub enum TopofixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model description has no modelTopology section")]
    MissingTopology,

    #[error("topology has no layer list (expected config.layers or model_config.config.layers)")]
    MissingLayers,

    #[error("layer '{layer}' references unknown inbound layer '{inbound}'")]
    UnknownInbound { layer: String, inbound: String },

    #[error("weight shard {path}: {source}")]
    ShardRead {
        path: String,
        source: std::io::Error,
    },

    #[error("unsupported weight dtype '{0}'")]
    UnsupportedDtype(String),

    #[error("weight buffer is {actual} bytes but the manifest declares {expected}")]
    WeightLengthMismatch { expected: usize, actual: usize },
}
