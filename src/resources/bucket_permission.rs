use std::fmt::Display;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{garage_admin::Permissions, Error, Result};

/// Permissions of one access key on one bucket, managed as `garage_bucket_permission`
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BucketPermission {
    /// The unique identifier of the permission (format: bucket_id/access_key_id).
    pub id: Option<String>,

    /// The ID of the bucket.
    pub bucket_id: String,

    /// The ID of the access key.
    pub access_key_id: String,

    /// Grant read permission to the access key.
    pub read: bool,

    /// Grant write permission to the access key.
    pub write: bool,

    /// Grant owner permission to the access key.
    pub owner: bool,
}

impl BucketPermission {
    pub fn permissions(&self) -> Permissions {
        Permissions {
            read: self.read,
            write: self.write,
            owner: self.owner,
        }
    }

    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.read = permissions.read;
        self.write = permissions.write;
        self.owner = permissions.owner;
    }

    pub fn composite_id(&self) -> String {
        format!("{}/{}", self.bucket_id, self.access_key_id)
    }

    /// Split `bucket_id/access_key_id` on its first slash
    pub fn parse_id(id: &str) -> Result<(&str, &str)> {
        match id.split_once('/') {
            Some((bucket_id, access_key_id)) if !bucket_id.is_empty() && !access_key_id.is_empty() => {
                Ok((bucket_id, access_key_id))
            }
            _ => Err(Error::IllegalImportId(id.to_string())),
        }
    }
}

/// Format is RWO, where R is read, W is write, and O is owner. Missing permissions
/// show as -.
impl Display for BucketPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.read { 'R' } else { '-' })?;
        write!(f, "{}", if self.write { 'W' } else { '-' })?;
        write!(f, "{}", if self.owner { 'O' } else { '-' })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_splits_on_first_slash() {
        assert_eq!(BucketPermission::parse_id("b1/k1").unwrap(), ("b1", "k1"));
        assert_eq!(
            BucketPermission::parse_id("b1/k1/extra").unwrap(),
            ("b1", "k1/extra")
        );
    }

    #[test]
    fn parse_id_rejects_missing_parts() {
        for id in ["b1k1", "", "/k1", "b1/"] {
            let err = BucketPermission::parse_id(id).unwrap_err();
            assert!(matches!(err, Error::IllegalImportId(_)), "{id}: {err:?}");
        }
    }

    #[test]
    fn friendly_permissions() {
        let perm = BucketPermission {
            read: true,
            owner: true,
            ..Default::default()
        };
        assert_eq!(perm.to_string(), "R-O");
        assert_eq!(BucketPermission::default().to_string(), "---");
    }
}
