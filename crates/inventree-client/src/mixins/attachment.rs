//! File and link attachments against a record
//!
//! Attachments live in a single `attachment/` collection keyed by
//! `(model_type, model_id)`.

use serde_json::{Map, Value};

use crate::common::UploadFile;
use crate::error::InvenTreeError;
use crate::models::{Attachment, Entity, Model};

/// Models that accept attachments
pub trait Attachments: Model {}

fn attachment_target<M: Model>(entity: &Entity<M>) -> Result<Map<String, Value>, InvenTreeError> {
    let model_type = M::MODEL_TYPE.ok_or_else(|| {
        InvenTreeError::InvalidArgument(format!("{} has no model type for attachments", M::NAME))
    })?;

    let mut target = Map::new();
    target.insert("model_type".to_string(), Value::from(model_type));
    target.insert("model_id".to_string(), entity.pk().to_value());
    Ok(target)
}

impl<M: Attachments> Entity<M> {
    /// Attachments linked to this record
    pub async fn get_attachments(&self) -> Result<Vec<Attachment>, InvenTreeError> {
        let model_type = M::MODEL_TYPE.unwrap_or_default();
        let model_id = self.pk().to_string();
        Attachment::list(self.api(), &[("model_type", model_type), ("model_id", model_id.as_str())]).await
    }

    /// Upload a file attachment against this record
    pub async fn upload_attachment(&self, file: UploadFile, comment: &str) -> Result<Attachment, InvenTreeError> {
        Attachment::upload(self.api(), file, comment, attachment_target(self)?).await
    }

    /// Attach an external link to this record
    pub async fn add_link_attachment(&self, link: &str, comment: &str) -> Result<Attachment, InvenTreeError> {
        Attachment::add_link(self.api(), link, comment, attachment_target(self)?).await
    }
}
