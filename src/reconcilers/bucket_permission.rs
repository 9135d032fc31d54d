use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::{
    garage_admin::{BucketInfo, BucketLookup, GarageAdmin},
    resources::BucketPermission,
    schema::{Attribute, AttributeType, Schema},
    Error, Result,
};

use super::{permission::PermissionChange, type_name, Reconcile};

impl BucketPermission {
    /// Take the key's flags from the bucket's key list. A key missing from the list holds none.
    fn sync_from(&mut self, bucket: &BucketInfo) {
        self.set_permissions(bucket.permissions_of(&self.access_key_id));
    }
}

#[async_trait]
impl Reconcile for BucketPermission {
    const TYPE_NAME: &'static str = "bucket_permission";

    fn schema() -> Schema {
        use AttributeType::*;

        Schema {
            type_name: type_name(Self::TYPE_NAME),
            description: "Manages permissions for an access key on a Garage S3 bucket.",
            attributes: vec![
                Attribute::computed(
                    "id",
                    String,
                    "The unique identifier of the permission (format: bucket_id/access_key_id).",
                )
                .use_state_for_unknown(),
                Attribute::required("bucket_id", String, "The ID of the bucket.").requires_replace(),
                Attribute::required("access_key_id", String, "The ID of the access key.")
                    .requires_replace(),
                Attribute::optional("read", Bool, "Grant read permission to the access key.")
                    .with_default(false),
                Attribute::optional("write", Bool, "Grant write permission to the access key.")
                    .with_default(false),
                Attribute::optional("owner", Bool, "Grant owner permission to the access key.")
                    .with_default(false),
            ],
            json_schema: schemars::schema_for!(BucketPermission),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bucket_id.is_empty() || self.access_key_id.is_empty() {
            return Err(Error::IllegalResource(
                "Both 'bucket_id' and 'access_key_id' must be set".into(),
            ));
        }

        Ok(())
    }

    async fn create(mut self, admin: &GarageAdmin) -> Result<Self> {
        self.validate()?;
        debug!(
            bucket_id = %self.bucket_id,
            access_key_id = %self.access_key_id,
            permissions = %self,
            "Creating bucket permission"
        );

        let bucket = admin
            .allow_bucket_key(&self.bucket_id, &self.access_key_id, self.permissions())
            .await?;

        self.id = Some(self.composite_id());
        self.sync_from(&bucket);
        trace!(id = ?self.id, "Created bucket permission");

        Ok(self)
    }

    async fn read(mut self, admin: &GarageAdmin) -> Result<Option<Self>> {
        let bucket = admin
            .get_bucket_info(BucketLookup::Id(&self.bucket_id))
            .await?;

        match bucket {
            Some(bucket) => {
                self.id = Some(self.composite_id());
                self.sync_from(&bucket);
                Ok(Some(self))
            }
            None => {
                info!(bucket_id = %self.bucket_id, "Bucket is gone, removing permission from state");
                Ok(None)
            }
        }
    }

    async fn update(mut self, prior: Self, admin: &GarageAdmin) -> Result<Self> {
        debug!(
            bucket_id = %self.bucket_id,
            access_key_id = %self.access_key_id,
            from = %prior,
            to = %self,
            "Updating bucket permission"
        );

        let change = PermissionChange::between(prior.permissions(), self.permissions());
        let bucket = change
            .apply(admin, &self.bucket_id, &self.access_key_id)
            .await?;

        self.id = Some(self.composite_id());
        if let Some(bucket) = bucket {
            self.sync_from(&bucket);
        }
        trace!(id = ?self.id, "Updated bucket permission");

        Ok(self)
    }

    async fn delete(self, admin: &GarageAdmin) -> Result<()> {
        debug!(
            bucket_id = %self.bucket_id,
            access_key_id = %self.access_key_id,
            "Deleting bucket permission"
        );

        let change = PermissionChange::between(self.permissions(), Default::default());
        change
            .apply(admin, &self.bucket_id, &self.access_key_id)
            .await?;
        trace!(id = ?self.id, "Deleted bucket permission");

        Ok(())
    }

    fn import(id: &str) -> Result<Self> {
        let (bucket_id, access_key_id) = Self::parse_id(id)?;

        Ok(Self {
            id: Some(id.to_string()),
            bucket_id: bucket_id.to_string(),
            access_key_id: access_key_id.to_string(),
            ..Default::default()
        })
    }
}
