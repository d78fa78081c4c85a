//! Per-record JSON metadata
//!
//! Metadata is not used by any server business logic; plugins use it to
//! store arbitrary data against a record at `{url}/{pk}/metadata/`.

use serde_json::{Map, Value, json};

use crate::error::InvenTreeError;
use crate::models::{Entity, Model};

/// Models exposing a `metadata/` sub-endpoint
pub trait Metadata: Model {}

impl<M: Metadata> Entity<M> {
    /// Endpoint of this record's metadata
    pub fn metadata_url(&self) -> String {
        format!("{}metadata/", self.url())
    }

    /// Read the metadata of this record
    pub async fn get_metadata(&self) -> Result<Value, InvenTreeError> {
        let mut response = self.api().get(&self.metadata_url(), &[]).await?;
        match response.get_mut("metadata") {
            Some(metadata) => Ok(metadata.take()),
            None => Err(InvenTreeError::KeyNotFound("metadata".to_string())),
        }
    }

    /// Write metadata to this record
    ///
    /// With `overwrite` the supplied object replaces the stored metadata
    /// (PUT); otherwise it is merged into it (PATCH).
    pub async fn set_metadata(&self, data: Map<String, Value>, overwrite: bool) -> Result<Value, InvenTreeError> {
        let body = json!({ "metadata": data });
        let url = self.metadata_url();

        if overwrite {
            self.api().put(&url, body).await
        } else {
            self.api().patch(&url, body).await
        }
    }
}
