//! Shared error types for the content orchestrator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid UUID: {input}")]
    InvalidUuid { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Seed data error: {message}")]
    SeedError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
