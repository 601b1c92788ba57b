use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Command failed: {command}: {stderr}")]
    Exec { command: String, stderr: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Secret generation failed: {0}")]
    Generation(String),
    #[error("Secret load failed: {0}")]
    Load(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
