use thiserror::Error;

/// Configuration-shape failures. Any of these aborts a run before fetching.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pipeline config at {path}: {source}")]
    ConfigFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pipeline config: {0}")]
    ConfigFileParse(#[from] serde_yaml::Error),

    #[error("no source configuration for adapter '{0}'")]
    MissingSourceConfig(String),

    #[error("source '{source_id}' has no {kind} taxonomy (needs a default or a label map)")]
    MissingTaxonomy {
        source_id: String,
        kind: &'static str,
    },

    #[error("invalid weight {name} = {value}: must be finite and non-negative")]
    InvalidWeight { name: String, value: f64 },

    #[error("invalid pipeline config: {0}")]
    Validation(String),
}
