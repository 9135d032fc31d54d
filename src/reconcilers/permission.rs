//! Moving a key's permissions on a bucket from one triple to another.
//!
//! Garage has no "set permissions" call: granting and revoking are two
//! separate endpoints that each only touch the flags they are given. A change
//! is therefore computed per flag and split into at most one grant and one
//! revoke. The grant goes out first. When the revoke then fails, the key is
//! left holding the union of old and new flags until the next apply.

use tracing::debug;

use crate::{
    garage_admin::{BucketInfo, GarageAdmin, Permissions},
    Result,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionChange {
    /// Flags turning on
    pub grant: Permissions,
    /// Flags turning off
    pub revoke: Permissions,
}

impl PermissionChange {
    pub fn between(prior: Permissions, desired: Permissions) -> Self {
        Self {
            grant: Permissions {
                read: !prior.read && desired.read,
                write: !prior.write && desired.write,
                owner: !prior.owner && desired.owner,
            },
            revoke: Permissions {
                read: prior.read && !desired.read,
                write: prior.write && !desired.write,
                owner: prior.owner && !desired.owner,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.grant.any() && !self.revoke.any()
    }

    /// Issue the grant and revoke calls this change needs, in that order.
    ///
    /// Returns the bucket as garage reported it after the last call, or `None`
    /// if no call was needed.
    pub async fn apply(
        &self,
        admin: &GarageAdmin,
        bucket_id: &str,
        access_key_id: &str,
    ) -> Result<Option<BucketInfo>> {
        let mut bucket = None;

        if self.grant.any() {
            debug!(bucket_id, access_key_id, grant = ?self.grant, "Granting bucket permissions");
            bucket = Some(
                admin
                    .allow_bucket_key(bucket_id, access_key_id, self.grant)
                    .await?,
            );
        }

        if self.revoke.any() {
            debug!(bucket_id, access_key_id, revoke = ?self.revoke, "Revoking bucket permissions");
            bucket = Some(
                admin
                    .deny_bucket_key(bucket_id, access_key_id, self.revoke)
                    .await?,
            );
        }

        Ok(bucket)
    }
}
