use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::{
    garage_admin::{
        BucketInfo, BucketLookup, BucketQuotas, GarageAdmin, UpdateBucketRequest, WebsiteAccess,
    },
    resources::{Bucket, BucketUsage},
    schema::{Attribute, AttributeType, Schema},
    Error, Result,
};

use super::{type_name, Reconcile};

impl Bucket {
    fn remote_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .ok_or_else(|| Error::IllegalResource("bucket has no ID in state".into()))
    }

    fn website_access(&self) -> WebsiteAccess {
        WebsiteAccess {
            enabled: self.website_enabled,
            index_document: self.website_index_document.clone(),
            error_document: self.website_error_document.clone(),
        }
    }

    fn quotas(&self) -> BucketQuotas {
        BucketQuotas {
            max_size: self.max_size,
            max_objects: self.max_objects,
        }
    }

    /// Only the settings present in configuration, for the update following creation
    fn initial_settings(&self) -> UpdateBucketRequest {
        let website = self.website_enabled
            || self.website_index_document.is_some()
            || self.website_error_document.is_some();
        let quotas = self.max_size.is_some() || self.max_objects.is_some();

        UpdateBucketRequest {
            website_access: website.then(|| self.website_access()),
            quotas: quotas.then(|| self.quotas()),
        }
    }

    /// Every setting, so that anything removed from configuration is cleared remotely
    fn all_settings(&self) -> UpdateBucketRequest {
        UpdateBucketRequest {
            website_access: Some(self.website_access()),
            quotas: Some(self.quotas()),
        }
    }

    /// Take the server-assigned values from a bucket, leaving configured values alone
    fn apply_computed(&mut self, info: &BucketInfo) {
        self.id = Some(info.id.clone());
        self.usage = BucketUsage::from(info);
    }

    /// Overwrite this state with what garage reports
    fn apply_remote(&mut self, info: &BucketInfo) {
        self.apply_computed(info);

        if let Some(alias) = info.primary_alias() {
            self.global_alias = alias.to_string();
        }

        self.website_enabled = info.website_access;
        match &info.website_config {
            Some(config) => {
                self.website_index_document = Some(config.index_document.clone());
                self.website_error_document = config.error_document.clone();
            }
            None => {
                self.website_index_document = None;
                self.website_error_document = None;
            }
        }

        let quotas = info.quotas.clone().unwrap_or_default();
        self.max_size = quotas.max_size;
        self.max_objects = quotas.max_objects;
    }
}

impl From<&BucketInfo> for BucketUsage {
    fn from(info: &BucketInfo) -> Self {
        Self {
            objects: Some(info.objects),
            bytes: Some(info.bytes),
            unfinished_uploads: Some(info.unfinished_uploads),
        }
    }
}

#[async_trait]
impl Reconcile for Bucket {
    const TYPE_NAME: &'static str = "bucket";

    fn schema() -> Schema {
        use AttributeType::*;

        Schema {
            type_name: type_name(Self::TYPE_NAME),
            description: "Manages a Garage S3 bucket.",
            attributes: vec![
                Attribute::computed("id", String, "The unique identifier of the bucket.")
                    .use_state_for_unknown(),
                Attribute::required(
                    "global_alias",
                    String,
                    "The global alias (name) for the bucket.",
                )
                .requires_replace(),
                Attribute::optional(
                    "website_enabled",
                    Bool,
                    "Enable website hosting for this bucket.",
                )
                .with_default(false),
                Attribute::optional(
                    "website_index_document",
                    String,
                    "The index document for website hosting (e.g., 'index.html').",
                ),
                Attribute::optional(
                    "website_error_document",
                    String,
                    "The error document for website hosting (e.g., 'error.html').",
                ),
                Attribute::optional(
                    "max_size",
                    Number,
                    "Maximum size of the bucket in bytes. Leave unset for unlimited.",
                ),
                Attribute::optional(
                    "max_objects",
                    Number,
                    "Maximum number of objects in the bucket. Leave unset for unlimited.",
                ),
                Attribute::computed("objects", Number, "Number of objects stored in the bucket."),
                Attribute::computed("bytes", Number, "Total size of the objects stored in the bucket, in bytes."),
                Attribute::computed(
                    "unfinished_uploads",
                    Number,
                    "Number of multipart uploads that were started but not completed.",
                ),
            ],
            json_schema: schemars::schema_for!(Bucket),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.global_alias.is_empty() {
            return Err(Error::IllegalResource(
                "The 'global_alias' attribute must not be empty".into(),
            ));
        }

        Ok(())
    }

    async fn create(mut self, admin: &GarageAdmin) -> Result<Self> {
        self.validate()?;
        debug!(global_alias = %self.global_alias, "Creating bucket");

        let created = admin.create_bucket(&self.global_alias).await?;

        // Website and quota settings cannot be passed at creation time
        let settings = self.initial_settings();
        let bucket = if settings.is_empty() {
            created
        } else {
            admin.update_bucket(&created.id, &settings).await?
        };

        self.apply_computed(&bucket);
        info!(id = %bucket.id, global_alias = %self.global_alias, "Created bucket");

        Ok(self)
    }

    async fn read(mut self, admin: &GarageAdmin) -> Result<Option<Self>> {
        let id = self.remote_id()?;
        let bucket = admin.get_bucket_info(BucketLookup::Id(id)).await?;

        match bucket {
            Some(bucket) => {
                self.apply_remote(&bucket);
                Ok(Some(self))
            }
            None => {
                info!(id, "Bucket is gone, removing it from state");
                Ok(None)
            }
        }
    }

    async fn update(mut self, prior: Self, admin: &GarageAdmin) -> Result<Self> {
        if self.id.is_none() {
            self.id = prior.id;
        }
        let id = self.remote_id()?.to_string();
        debug!(id = %id, global_alias = %self.global_alias, "Updating bucket");

        let bucket = admin.update_bucket(&id, &self.all_settings()).await?;
        self.apply_computed(&bucket);
        trace!(id = %id, "Updated bucket");

        Ok(self)
    }

    async fn delete(self, admin: &GarageAdmin) -> Result<()> {
        let id = self.remote_id()?;
        debug!(id, global_alias = %self.global_alias, "Deleting bucket");

        admin.delete_bucket(id).await?;
        trace!(id, "Deleted bucket");

        Ok(())
    }

    fn import(id: &str) -> Result<Self> {
        Ok(Self {
            id: Some(id.to_string()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    use super::*;
    use crate::testing::FakeGarage;

    fn bucket(alias: &str) -> Bucket {
        Bucket {
            global_alias: alias.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_without_settings_is_a_single_call() {
        let garage = FakeGarage::start().await;

        let created = bucket("photos").create(&garage.admin).await.unwrap();
        assert!(created.id.is_some());
        assert_eq!(created.usage.objects, Some(0));

        let calls = garage.calls();
        assert_eq!(calls.len(), 1);
        assert_json_eq!(calls[0].body.clone().unwrap(), json!({ "globalAlias": "photos" }));
    }

    #[tokio::test]
    async fn quotas_round_trip() {
        let garage = FakeGarage::start().await;

        let created = Bucket {
            max_size: Some(1_073_741_824),
            ..bucket("photos")
        }
        .create(&garage.admin)
        .await
        .unwrap();
        assert_json_eq!(
            garage.last_call().body.unwrap(),
            json!({ "quotas": { "maxSize": 1073741824 } })
        );

        let read = created.read(&garage.admin).await.unwrap().unwrap();
        assert_eq!(read.max_size, Some(1_073_741_824));
        assert_eq!(read.max_objects, None);
    }

    #[tokio::test]
    async fn bucket_without_quotas_reads_back_unset() {
        let garage = FakeGarage::start().await;

        let created = bucket("photos").create(&garage.admin).await.unwrap();
        let read = created.read(&garage.admin).await.unwrap().unwrap();

        assert_eq!(read.max_size, None);
        assert_eq!(read.max_objects, None);
        assert!(!read.website_enabled);
        assert_eq!(read.website_index_document, None);
    }

    #[tokio::test]
    async fn website_settings_are_applied_after_creation() {
        let garage = FakeGarage::start().await;

        let created = Bucket {
            website_enabled: true,
            website_index_document: Some("index.html".into()),
            website_error_document: Some("error.html".into()),
            ..bucket("site")
        }
        .create(&garage.admin)
        .await
        .unwrap();

        assert_json_eq!(
            garage.last_call().body.unwrap(),
            json!({
                "websiteAccess": {
                    "enabled": true,
                    "indexDocument": "index.html",
                    "errorDocument": "error.html",
                }
            })
        );

        let read = created.read(&garage.admin).await.unwrap().unwrap();
        assert!(read.website_enabled);
        assert_eq!(read.website_error_document.as_deref(), Some("error.html"));
    }

    #[tokio::test]
    async fn update_sends_full_settings() {
        let garage = FakeGarage::start().await;
        let prior = Bucket {
            max_size: Some(1024),
            ..bucket("photos")
        }
        .create(&garage.admin)
        .await
        .unwrap();

        let planned = Bucket {
            id: None,
            max_size: None,
            max_objects: Some(10),
            ..prior.clone()
        };
        let updated = planned.update(prior.clone(), &garage.admin).await.unwrap();
        assert_eq!(updated.id, prior.id);

        assert_json_eq!(
            garage.last_call().body.unwrap(),
            json!({
                "websiteAccess": { "enabled": false },
                "quotas": { "maxObjects": 10 },
            })
        );

        let read = updated.read(&garage.admin).await.unwrap().unwrap();
        assert_eq!(read.max_size, None);
        assert_eq!(read.max_objects, Some(10));
    }

    #[tokio::test]
    async fn missing_bucket_is_dropped_from_state() {
        let garage = FakeGarage::start().await;

        let state = Bucket::import("gone").unwrap();
        assert!(state.read(&garage.admin).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn import_then_read_fills_state() {
        let garage = FakeGarage::start().await;
        garage.seed_bucket("b1", "photos");

        let state = Bucket::import("b1").unwrap();
        let read = state.read(&garage.admin).await.unwrap().unwrap();
        assert_eq!(read.global_alias, "photos");
        assert_eq!(read.id.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn delete_removes_the_bucket() {
        let garage = FakeGarage::start().await;
        garage.seed_bucket("b1", "photos");

        Bucket::import("b1")
            .unwrap()
            .delete(&garage.admin)
            .await
            .unwrap();
        assert!(garage.bucket("b1").is_none());
        assert_eq!(garage.last_call().query.get("id").map(String::as_str), Some("b1"));
    }
}
