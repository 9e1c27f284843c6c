use thiserror::Error;

#[derive(Debug, Error)]
pub enum NottifError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl NottifError {
    /// Short error code string used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            NottifError::Config(_) => "CONFIG_ERROR",
            NottifError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, NottifError>;
