use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};

use crate::{garage_admin::GarageAdmin, schema::Schema, Result};

pub mod access_key;
pub mod bucket;
pub mod bucket_permission;
pub mod data_source;
pub mod permission;

/// Prefix shared by every type this provider registers
pub const TYPE_PREFIX: &str = "garage";

/// A resource that can be reconciled against a garage instance.
///
/// Each method maps onto one Terraform lifecycle call and runs to completion
/// on its own data; nothing is shared between resource instances.
#[async_trait]
pub trait Reconcile
where
    Self: Sized + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
{
    /// Type name, without the provider prefix
    const TYPE_NAME: &'static str;

    /// How the resource is called in error messages
    fn noun() -> String {
        Self::TYPE_NAME.replace('_', " ")
    }

    fn schema() -> Schema;

    /// Reject a configuration before any remote call is made
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Create the remote object described by this planned state
    async fn create(self, admin: &GarageAdmin) -> Result<Self>;

    /// Refresh this state from garage, returning `None` once the remote object is gone
    async fn read(self, admin: &GarageAdmin) -> Result<Option<Self>>;

    /// Move the remote object from `prior` to this planned state
    async fn update(self, prior: Self, admin: &GarageAdmin) -> Result<Self>;

    async fn delete(self, admin: &GarageAdmin) -> Result<()>;

    /// Build the partial state an import ID stands for. A `read` follows to fill in the rest.
    fn import(id: &str) -> Result<Self>;
}

/// A read-only lookup exposed as a data source
#[async_trait]
pub trait Lookup
where
    Self: Sized + Serialize + DeserializeOwned + JsonSchema + Send + Sync,
{
    const TYPE_NAME: &'static str;

    fn schema() -> Schema;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn lookup(self, admin: &GarageAdmin) -> Result<Self>;
}

/// Full Terraform type name of a resource or data source
pub fn type_name(name: &str) -> String {
    format!("{TYPE_PREFIX}_{name}")
}
