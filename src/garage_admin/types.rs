//! Request and response bodies of the admin API, as they appear on the wire.

use serde::{Deserialize, Serialize};

/// Full description of a bucket, returned by most bucket calls
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
    #[serde(default)]
    pub website_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_config: Option<WebsiteConfig>,
    #[serde(default)]
    pub keys: Vec<BucketKeyInfo>,
    #[serde(default)]
    pub objects: i64,
    #[serde(default)]
    pub bytes: i64,
    #[serde(default)]
    pub unfinished_uploads: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,
}

impl BucketInfo {
    /// The alias presented as the bucket's name
    pub fn primary_alias(&self) -> Option<&str> {
        self.global_aliases.first().map(String::as_str)
    }

    /// Permissions held by a key on this bucket. Keys missing from the list hold none.
    pub fn permissions_of(&self, access_key_id: &str) -> Permissions {
        self.keys
            .iter()
            .find(|k| k.access_key_id == access_key_id)
            .map(|k| k.permissions)
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteConfig {
    pub index_document: String,
    #[serde(default)]
    pub error_document: Option<String>,
}

/// A key listed on a bucket along with what it may do there
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketKeyInfo {
    pub access_key_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

/// The read/write/owner triple a key holds on a bucket
#[derive(Deserialize, Serialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub owner: bool,
}

impl Permissions {
    pub fn any(&self) -> bool {
        self.read || self.write || self.owner
    }
}

/// Quotas of a bucket. An absent field means no limit.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketQuotas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsItem {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_alias: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBucketRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_access: Option<WebsiteAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,
}

impl UpdateBucketRequest {
    pub fn is_empty(&self) -> bool {
        self.website_access.is_none() && self.quotas.is_none()
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteAccess {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_document: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BucketAliasRequest {
    pub bucket_id: String,
    pub global_alias: String,
}

/// Body shared by the grant and the revoke call
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketKeyPermRequest {
    pub bucket_id: String,
    pub access_key_id: String,
    pub permissions: Permissions,
}

/// Description of an access key. The secret is only present when the server chooses to expose it.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub access_key_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub buckets: Vec<KeyBucketInfo>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyBucketInfo {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
    #[serde(default)]
    pub permissions: Permissions,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
pub struct ListKeysItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug)]
pub struct CreateKeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Adopt a key whose credentials were generated elsewhere
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImportKeyRequest {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug)]
pub struct UpdateKeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
