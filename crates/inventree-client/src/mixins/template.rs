//! Label and report template files

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::common::UploadFile;
use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::models::{Entity, Model, SaveMethod};

/// Api version from which templates can be created over the API
pub const TEMPLATE_UPLOAD_API_VERSION: u32 = 156;

/// Models backed by an uploaded template file
pub trait Template: Model {
    /// Name of the file field ("label" or "template")
    const TEMPLATE_FIELD: &'static str;
}

impl<M: Template> Entity<M> {
    /// Create a template by uploading its file
    ///
    /// `data` must include at least a name and description.
    pub async fn create_template(
        api: &SharedClient,
        data: Map<String, Value>,
        file: UploadFile,
    ) -> Result<Self, InvenTreeError> {
        let file = UploadFile {
            field: M::TEMPLATE_FIELD.to_string(),
            ..file
        };
        Self::create_checked(api, data, vec![file], TEMPLATE_UPLOAD_API_VERSION).await
    }

    /// Update template data and optionally replace its file
    ///
    /// When only a file is given, no other fields are sent.
    pub async fn save_template(
        &mut self,
        data: Option<Map<String, Value>>,
        file: Option<UploadFile>,
    ) -> Result<Value, InvenTreeError> {
        match file {
            Some(file) => {
                let file = UploadFile {
                    field: M::TEMPLATE_FIELD.to_string(),
                    ..file
                };
                self.save_with(Some(data.unwrap_or_default()), vec![file], SaveMethod::Patch)
                    .await
            }
            None => self.save_with(data, Vec::new(), SaveMethod::Patch).await,
        }
    }

    /// Download the template file
    pub async fn download_template(&self, destination: &Path, overwrite: bool) -> Result<PathBuf, InvenTreeError> {
        self.download_field(M::TEMPLATE_FIELD, destination, overwrite).await
    }
}
