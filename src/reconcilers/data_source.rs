use async_trait::async_trait;
use tracing::debug;

use crate::{
    garage_admin::{BucketInfo, BucketLookup, GarageAdmin},
    resources::{BucketData, BucketDataKey, BucketUsage},
    schema::{Attribute, AttributeType, Schema},
    Error, Result,
};

use super::{type_name, Lookup};

impl BucketData {
    fn selector(&self) -> Result<BucketLookup<'_>> {
        match (&self.id, &self.global_alias) {
            (Some(id), None) => Ok(BucketLookup::Id(id)),
            (None, Some(alias)) => Ok(BucketLookup::GlobalAlias(alias)),
            _ => Err(Error::IllegalResource(
                "Exactly one of 'id' or 'global_alias' must be set".into(),
            )),
        }
    }

    fn fill(&mut self, info: &BucketInfo) {
        self.id = Some(info.id.clone());
        self.global_alias = info.primary_alias().map(str::to_string);
        self.global_aliases = info.global_aliases.clone();

        self.website_enabled = info.website_access;
        self.website_index_document = info.website_config.as_ref().map(|c| c.index_document.clone());
        self.website_error_document = info
            .website_config
            .as_ref()
            .and_then(|c| c.error_document.clone());

        let quotas = info.quotas.clone().unwrap_or_default();
        self.max_size = quotas.max_size;
        self.max_objects = quotas.max_objects;

        self.usage = BucketUsage::from(info);
        self.keys = info
            .keys
            .iter()
            .map(|key| BucketDataKey {
                access_key_id: key.access_key_id.clone(),
                name: key.name.clone(),
                read: key.permissions.read,
                write: key.permissions.write,
                owner: key.permissions.owner,
            })
            .collect();
    }
}

#[async_trait]
impl Lookup for BucketData {
    const TYPE_NAME: &'static str = "bucket";

    fn schema() -> Schema {
        use AttributeType::*;

        Schema {
            type_name: type_name(Self::TYPE_NAME),
            description: "Looks up an existing Garage S3 bucket by ID or global alias.",
            attributes: vec![
                Attribute::optional(
                    "id",
                    String,
                    "The unique identifier of the bucket. Either this or `global_alias` must be set.",
                )
                .or_computed(),
                Attribute::optional(
                    "global_alias",
                    String,
                    "The global alias of the bucket. Either this or `id` must be set.",
                )
                .or_computed(),
                Attribute::computed("global_aliases", StringList, "Every global alias of the bucket."),
                Attribute::computed("website_enabled", Bool, "Whether website hosting is enabled."),
                Attribute::computed(
                    "website_index_document",
                    String,
                    "The index document for website hosting.",
                ),
                Attribute::computed(
                    "website_error_document",
                    String,
                    "The error document for website hosting.",
                ),
                Attribute::computed("max_size", Number, "Maximum size of the bucket in bytes."),
                Attribute::computed("max_objects", Number, "Maximum number of objects in the bucket."),
                Attribute::computed("objects", Number, "Number of objects stored in the bucket."),
                Attribute::computed("bytes", Number, "Total size of the objects stored in the bucket, in bytes."),
                Attribute::computed(
                    "unfinished_uploads",
                    Number,
                    "Number of multipart uploads that were started but not completed.",
                ),
                Attribute::computed(
                    "keys",
                    ObjectList,
                    "Access keys holding permissions on the bucket.",
                ),
            ],
            json_schema: schemars::schema_for!(BucketData),
        }
    }

    fn validate(&self) -> Result<()> {
        self.selector().map(|_| ())
    }

    async fn lookup(mut self, admin: &GarageAdmin) -> Result<Self> {
        let lookup = self.selector()?;
        debug!(?lookup, "Looking up bucket");

        let info = admin
            .get_bucket_info(lookup)
            .await?
            .ok_or(Error::NotFound("bucket"))?;

        self.fill(&info);
        Ok(self)
    }
}
