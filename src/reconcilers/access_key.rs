use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::{
    garage_admin::GarageAdmin,
    resources::AccessKey,
    schema::{Attribute, AttributeType, Schema},
    Error, Result,
};

use super::{type_name, Reconcile};

impl AccessKey {
    fn remote_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .ok_or_else(|| Error::IllegalResource("access key has no ID in state".into()))
    }
}

#[async_trait]
impl Reconcile for AccessKey {
    const TYPE_NAME: &'static str = "key";

    fn noun() -> String {
        "access key".into()
    }

    fn schema() -> Schema {
        Schema {
            type_name: type_name(Self::TYPE_NAME),
            description: "Manages a Garage access key.",
            attributes: vec![
                Attribute::optional(
                    "id",
                    AttributeType::String,
                    "The access key ID. Set together with `secret_access_key` to adopt an existing key.",
                )
                .or_computed()
                .requires_replace()
                .use_state_for_unknown(),
                Attribute::optional(
                    "name",
                    AttributeType::String,
                    "A human-friendly name for the access key.",
                )
                .or_computed(),
                Attribute::optional(
                    "secret_access_key",
                    AttributeType::String,
                    "The secret access key (only available on creation).",
                )
                .or_computed()
                .sensitive()
                .requires_replace()
                .use_state_for_unknown(),
            ],
            json_schema: schemars::schema_for!(AccessKey),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_some() != self.secret_access_key.is_some() {
            return Err(Error::IllegalResource(
                "Both 'id' and 'secret_access_key' must be provided together to import an existing key"
                    .into(),
            ));
        }

        Ok(())
    }

    async fn create(mut self, admin: &GarageAdmin) -> Result<Self> {
        self.validate()?;
        debug!(name = ?self.name, "Creating access key");

        let key = match (&self.id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                admin.import_key(id, secret, self.name.as_deref()).await?
            }
            _ => admin.create_key(self.name.as_deref()).await?,
        };

        self.id = Some(key.access_key_id);
        self.name = Some(key.name);
        if key.secret_access_key.is_some() {
            self.secret_access_key = key.secret_access_key;
        }
        info!(id = ?self.id, "Created access key");

        Ok(self)
    }

    async fn read(mut self, admin: &GarageAdmin) -> Result<Option<Self>> {
        let id = self.remote_id()?;
        let key = admin.get_key_info(id).await?;

        match key {
            // The secret is never handed out again, so whatever state holds is kept
            Some(key) => {
                self.id = Some(key.access_key_id);
                self.name = Some(key.name);
                Ok(Some(self))
            }
            None => {
                info!(id, "Access key is gone, removing it from state");
                Ok(None)
            }
        }
    }

    async fn update(mut self, prior: Self, admin: &GarageAdmin) -> Result<Self> {
        if self.id.is_none() {
            self.id = prior.id;
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = prior.secret_access_key;
        }

        if self.name.is_none() {
            self.name = prior.name.clone();
        }

        if let Some(name) = self.name.as_deref() {
            if prior.name.as_deref() != Some(name) {
                let id = self.remote_id()?;
                debug!(id, name, "Renaming access key");
                admin.update_key(id, name).await?;
            }
        }
        trace!(id = ?self.id, "Updated access key");

        Ok(self)
    }

    async fn delete(self, admin: &GarageAdmin) -> Result<()> {
        let id = self.remote_id()?;
        debug!(id, "Deleting access key");

        admin.delete_key(id).await?;
        trace!(id, "Deleted access key");

        Ok(())
    }

    /// Importing by ID cannot recover the secret; it stays unset
    fn import(id: &str) -> Result<Self> {
        Ok(Self {
            id: Some(id.to_string()),
            ..Default::default()
        })
    }
}
