use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An S3 access key, managed as `garage_key`.
///
/// Garage hands out the secret once, when the key is created. Supplying both
/// `id` and `secret_access_key` adopts a key generated elsewhere instead.
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AccessKey {
    /// The access key ID.
    pub id: Option<String>,

    /// A human-friendly name for the access key.
    pub name: Option<String>,

    /// The secret access key (only available on creation).
    pub secret_access_key: Option<String>,
}
