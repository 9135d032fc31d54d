use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod access_key;
mod bucket;
mod bucket_permission;

pub use access_key::*;
pub use bucket::*;
pub use bucket_permission::*;

/// The `provider "garage"` block
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// The Garage Admin API endpoint URL. Can also be set via the GARAGE_ENDPOINT environment variable.
    pub endpoint: Option<String>,

    /// The Garage Admin API bearer token. Can also be set via the GARAGE_TOKEN environment variable.
    pub token: Option<String>,
}
