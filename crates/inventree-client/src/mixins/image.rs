//! Image upload and download for models with an `image` field

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::common::UploadFile;
use crate::error::InvenTreeError;
use crate::models::{Entity, Model, SaveMethod};

/// Models carrying an `image` file field
pub trait Image: Model {}

impl<M: Image> Entity<M> {
    /// Upload a new image for this record
    ///
    /// The file is sent as the `image` field of a multipart PATCH; the record
    /// is refreshed from the response.
    pub async fn upload_image(&mut self, file: UploadFile) -> Result<Value, InvenTreeError> {
        let file = UploadFile { field: "image".to_string(), ..file };
        self.save_with(Some(Map::new()), vec![file], SaveMethod::Patch).await
    }

    /// Upload an image from a local file
    pub async fn upload_image_path(&mut self, path: impl AsRef<Path>) -> Result<Value, InvenTreeError> {
        let file = UploadFile::from_path("image", path).await?;
        self.upload_image(file).await
    }

    /// Download this record's image
    pub async fn download_image(&self, destination: &Path, overwrite: bool) -> Result<PathBuf, InvenTreeError> {
        match self.str_field("image").filter(|url| !url.is_empty()) {
            Some(url) => self.api().download_file(url, destination, overwrite, &[]).await,
            None => Err(InvenTreeError::InvalidArgument(format!(
                "{} does not have an associated image",
                self
            ))),
        }
    }
}
