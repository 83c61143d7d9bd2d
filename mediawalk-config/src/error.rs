use thiserror::Error;

/// Guard rails on loaded scanner configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_path_len must be greater than zero")]
    ZeroMaxPathLen,

    #[error("monitored root `{0}` must be an absolute path")]
    RelativeRoot(String),

    #[error("monitored root `{0}` must end with `/`")]
    UnterminatedRoot(String),
}
