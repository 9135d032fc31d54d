use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A bucket in a garage instance, managed as `garage_bucket`
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
pub struct Bucket {
    /// The unique identifier of the bucket.
    #[serde(default)]
    pub id: Option<String>,

    /// The global alias (name) for the bucket.
    #[serde(default)]
    pub global_alias: String,

    /// Enable website hosting for this bucket.
    #[serde(default)]
    pub website_enabled: bool,

    /// The index document for website hosting (e.g., 'index.html').
    #[serde(default)]
    pub website_index_document: Option<String>,

    /// The error document for website hosting (e.g., 'error.html').
    #[serde(default)]
    pub website_error_document: Option<String>,

    /// Maximum size of the bucket in bytes. Leave unset for unlimited.
    #[serde(default)]
    pub max_size: Option<u64>,

    /// Maximum number of objects in the bucket. Leave unset for unlimited.
    #[serde(default)]
    pub max_objects: Option<u64>,

    #[serde(flatten)]
    pub usage: BucketUsage,
}

/// Counters garage keeps about a bucket. Never configured, only read back.
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BucketUsage {
    /// Number of objects stored in the bucket.
    pub objects: Option<i64>,

    /// Total size of the objects stored in the bucket, in bytes.
    pub bytes: Option<i64>,

    /// Number of multipart uploads that were started but not completed.
    pub unfinished_uploads: Option<i64>,
}

/// Lookup of an existing bucket, read as the `garage_bucket` data source
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BucketData {
    /// The unique identifier of the bucket. Either this or `global_alias` must be set.
    pub id: Option<String>,

    /// The global alias of the bucket. Either this or `id` must be set.
    pub global_alias: Option<String>,

    /// Every global alias of the bucket.
    pub global_aliases: Vec<String>,

    pub website_enabled: bool,
    pub website_index_document: Option<String>,
    pub website_error_document: Option<String>,
    pub max_size: Option<u64>,
    pub max_objects: Option<u64>,

    #[serde(flatten)]
    pub usage: BucketUsage,

    /// Access keys holding permissions on the bucket.
    pub keys: Vec<BucketDataKey>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BucketDataKey {
    pub access_key_id: String,
    pub name: String,
    pub read: bool,
    pub write: bool,
    pub owner: bool,
}
