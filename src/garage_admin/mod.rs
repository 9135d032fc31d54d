use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result, ADMIN_API_VERSION};

mod types;

pub use types::*;

/// How a bucket is looked up by `GetBucketInfo`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketLookup<'a> {
    Id(&'a str),
    GlobalAlias(&'a str),
}

impl<'a> BucketLookup<'a> {
    fn query(&self) -> [(&'static str, &'a str); 1] {
        match *self {
            BucketLookup::Id(id) => [("id", id)],
            BucketLookup::GlobalAlias(alias) => [("globalAlias", alias)],
        }
    }
}

/// A handle to the admin API of a running garage instance.
///
/// Every method issues exactly one request and never retries. The handle is
/// cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GarageAdmin {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GarageAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarageAdmin")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GarageAdmin {
    /// Create a handle for the admin API at `endpoint`, authenticating with a bearer `token`.
    pub fn with_secret(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.strip_suffix('/').unwrap_or(endpoint).to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn list_buckets(&self) -> Result<Vec<ListBucketsItem>> {
        self.call(self.request(Method::GET, "ListBuckets")).await
    }

    /// Fetch a bucket, returning `None` when garage does not know it
    pub async fn get_bucket_info(&self, lookup: BucketLookup<'_>) -> Result<Option<BucketInfo>> {
        self.lookup(
            self.request(Method::GET, "GetBucketInfo")
                .query(&lookup.query()),
        )
        .await
    }

    pub async fn create_bucket(&self, global_alias: &str) -> Result<BucketInfo> {
        let body = CreateBucketRequest {
            global_alias: Some(global_alias.to_string()),
        };

        self.call(self.request(Method::POST, "CreateBucket").json(&body))
            .await
    }

    pub async fn update_bucket(
        &self,
        id: &str,
        update: &UpdateBucketRequest,
    ) -> Result<BucketInfo> {
        self.call(
            self.request(Method::POST, "UpdateBucket")
                .query(&[("id", id)])
                .json(update),
        )
        .await
    }

    pub async fn delete_bucket(&self, id: &str) -> Result<()> {
        self.call_empty(self.request(Method::POST, "DeleteBucket").query(&[("id", id)]))
            .await
    }

    pub async fn add_bucket_alias(&self, id: &str, alias: &str) -> Result<BucketInfo> {
        let body = BucketAliasRequest {
            bucket_id: id.to_string(),
            global_alias: alias.to_string(),
        };

        self.call(self.request(Method::POST, "AddBucketAlias").json(&body))
            .await
    }

    pub async fn remove_bucket_alias(&self, id: &str, alias: &str) -> Result<BucketInfo> {
        let body = BucketAliasRequest {
            bucket_id: id.to_string(),
            global_alias: alias.to_string(),
        };

        self.call(self.request(Method::POST, "RemoveBucketAlias").json(&body))
            .await
    }

    /// Grant the flags set in `permissions`. Flags left false are untouched.
    pub async fn allow_bucket_key(
        &self,
        bucket_id: &str,
        access_key_id: &str,
        permissions: Permissions,
    ) -> Result<BucketInfo> {
        let body = BucketKeyPermRequest {
            bucket_id: bucket_id.to_string(),
            access_key_id: access_key_id.to_string(),
            permissions,
        };

        self.call(self.request(Method::POST, "AllowBucketKey").json(&body))
            .await
    }

    /// Revoke the flags set in `permissions`. Flags left false are untouched.
    pub async fn deny_bucket_key(
        &self,
        bucket_id: &str,
        access_key_id: &str,
        permissions: Permissions,
    ) -> Result<BucketInfo> {
        let body = BucketKeyPermRequest {
            bucket_id: bucket_id.to_string(),
            access_key_id: access_key_id.to_string(),
            permissions,
        };

        self.call(self.request(Method::POST, "DenyBucketKey").json(&body))
            .await
    }

    pub async fn list_keys(&self) -> Result<Vec<ListKeysItem>> {
        self.call(self.request(Method::GET, "ListKeys")).await
    }

    /// Create a key. The response is the only time garage hands out its secret.
    pub async fn create_key(&self, name: Option<&str>) -> Result<KeyInfo> {
        let body = CreateKeyRequest {
            name: name.map(str::to_string),
        };

        self.call(self.request(Method::POST, "CreateKey").json(&body))
            .await
    }

    pub async fn import_key(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
        name: Option<&str>,
    ) -> Result<KeyInfo> {
        let body = ImportKeyRequest {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            name: name.map(str::to_string),
        };

        self.call(self.request(Method::POST, "ImportKey").json(&body))
            .await
    }

    /// Fetch a key, returning `None` when garage does not know it
    pub async fn get_key_info(&self, id: &str) -> Result<Option<KeyInfo>> {
        self.lookup(self.request(Method::GET, "GetKeyInfo").query(&[("id", id)]))
            .await
    }

    pub async fn update_key(&self, id: &str, name: &str) -> Result<KeyInfo> {
        let body = UpdateKeyRequest {
            name: Some(name.to_string()),
        };

        self.call(
            self.request(Method::POST, "UpdateKey")
                .query(&[("id", id)])
                .json(&body),
        )
        .await
    }

    pub async fn delete_key(&self, id: &str) -> Result<()> {
        self.call_empty(self.request(Method::POST, "DeleteKey").query(&[("id", id)]))
            .await
    }

    fn request(&self, method: Method, call: &str) -> RequestBuilder {
        debug!(%method, call, "admin API request");

        self.client
            .request(
                method,
                format!("{}/{ADMIN_API_VERSION}/{call}", self.endpoint),
            )
            .bearer_auth(&self.token)
    }

    /// Send a request, handing back the status and raw body of any answer
    async fn dispatch(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok((status, body.to_vec()))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (status, body) = self.dispatch(request).await?;
        check_status(status, &body)?;

        serde_json::from_slice(&body).map_err(Error::DecodeError)
    }

    async fn lookup<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let (status, body) = self.dispatch(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(status, &body)?;

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(Error::DecodeError)
    }

    async fn call_empty(&self, request: RequestBuilder) -> Result<()> {
        let (status, body) = self.dispatch(request).await?;

        check_status(status, &body)
    }
}

fn check_status(status: StatusCode, body: &[u8]) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    Err(Error::ApiError {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
    })
}
