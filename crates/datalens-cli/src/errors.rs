use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unknown severity '{severity}' for rule '{rule_type}'. Supported: ERROR, WARNING, INFO")]
    UnknownSeverity { severity: String, rule_type: String },

    #[error("Unsupported file extension for '{path}'. Supported: .csv, .parquet")]
    UnknownExtension { path: String },

    #[error("Parameter '{param}' of rule '{rule_type}' has an unsupported TOML type")]
    UnsupportedParam { param: String, rule_type: String },

    #[error(transparent)]
    Config(#[from] datalens_core::ConfigError),
}
