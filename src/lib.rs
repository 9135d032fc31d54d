use thiserror::Error;

/// Terraform-facing data models
pub mod resources;

/// CRUD adapters from the models onto the admin API
pub mod reconcilers;

/// Attribute tables and plan modifiers
pub mod schema;

/// Provider configuration and type dispatch
pub mod provider;

/// Client for the garage admin API
pub mod garage_admin;

/// Log integrations
pub mod telemetry;

#[cfg(test)]
mod testing;

/// Version of the garage admin API this provider speaks
pub const ADMIN_API_VERSION: &str = "v2";

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to execute request: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    DecodeError(#[source] serde_json::Error),

    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("invalid provider configuration: {0}")]
    IllegalConfig(String),

    #[error("{0}")]
    IllegalResource(String),

    #[error("Expected import ID format: bucket_id/access_key_id, got: {0}")]
    IllegalImportId(String),

    #[error("no {0} found matching the given attributes")]
    NotFound(&'static str),

    #[error("provider has not been configured")]
    NotConfigured,

    #[error("unknown type '{0}'")]
    UnknownType(String),
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The HTTP status carried by an admin API failure, if any
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Error::ApiError { status, .. } => Some(*status),
            Error::NetworkError(e) => e.status(),
            _ => None,
        }
    }
}
