//! File and link attachments
//!
//! A single collection holds attachments for every model type; see
//! [`crate::mixins::Attachments`] for the per-record helpers.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::model;
use crate::common::UploadFile;
use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::mixins::BulkDelete;

model! {
    /// File or link attached to another record
    Attachment(AttachmentModel) => "attachment/", min_api = 207
}

impl BulkDelete for AttachmentModel {}

impl Attachment {
    /// Upload a file attachment
    ///
    /// `target` carries the owning record, normally `model_type` and
    /// `model_id`. The file is always sent in the `attachment` field.
    pub async fn upload(
        api: &SharedClient,
        file: UploadFile,
        comment: &str,
        mut target: Map<String, Value>,
    ) -> Result<Self, InvenTreeError> {
        target.insert("comment".to_string(), Value::from(comment));

        let file = UploadFile {
            field: "attachment".to_string(),
            ..file
        };
        let file_name = file.file_name.clone();

        let attachment = Self::create_with_files(api, target, vec![file]).await?;
        info!("File '{}' uploaded to {}", file_name, attachment.url());
        Ok(attachment)
    }

    /// Upload a local file as an attachment
    pub async fn upload_path(
        api: &SharedClient,
        path: impl AsRef<Path>,
        comment: &str,
        target: Map<String, Value>,
    ) -> Result<Self, InvenTreeError> {
        let file = UploadFile::from_path("attachment", path).await?;
        Self::upload(api, file, comment, target).await
    }

    /// Add an external link attachment
    pub async fn add_link(
        api: &SharedClient,
        link: &str,
        comment: &str,
        mut target: Map<String, Value>,
    ) -> Result<Self, InvenTreeError> {
        target.insert("comment".to_string(), Value::from(comment));
        target.insert("link".to_string(), Value::from(link));

        let attachment = Self::create(api, target).await?;
        info!("Link attachment added at {}", attachment.url());
        Ok(attachment)
    }

    pub fn comment(&self) -> Option<&str> {
        self.str_field("comment")
    }

    /// External link, for link attachments
    pub fn link(&self) -> Option<&str> {
        self.str_field("link").filter(|l| !l.is_empty())
    }

    /// Download the attached file
    pub async fn download(&self, destination: &Path, overwrite: bool) -> Result<PathBuf, InvenTreeError> {
        self.download_field("attachment", destination, overwrite).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventree_trait::SharedClient;
    use crate::mock::MockInvenTreeClient;
    use crate::models::{Company, Part};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (MockInvenTreeClient, SharedClient) {
        let mock = MockInvenTreeClient::new("http://inventree.local");
        mock.insert("part", json!({"pk": 1, "name": "Widget"}));
        mock.insert("company", json!({"pk": 2, "name": "ACME"}));
        mock.register("attachment");
        let api: SharedClient = Arc::new(mock.clone());
        (mock, api)
    }

    #[tokio::test]
    async fn test_attachments_are_scoped_by_model() {
        let (_mock, api) = setup();
        let part = Part::with_pk(&api, 1).await.expect("part");
        let company = Company::with_pk(&api, 2).await.expect("company");

        let file = UploadFile::from_bytes("ignored", "datasheet.pdf", b"%PDF".to_vec());
        let uploaded = part.upload_attachment(file, "Datasheet").await.expect("upload");
        assert_eq!(uploaded.comment(), Some("Datasheet"));
        assert_eq!(uploaded.str_field("model_type"), Some("part"));

        company
            .add_link_attachment("https://acme.example/catalog", "Catalog")
            .await
            .expect("link");

        let part_attachments = part.get_attachments().await.expect("list");
        assert_eq!(part_attachments.len(), 1);
        assert!(part_attachments[0].link().is_none());

        let company_attachments = company.get_attachments().await.expect("list");
        assert_eq!(company_attachments.len(), 1);
        assert_eq!(company_attachments[0].link(), Some("https://acme.example/catalog"));
    }

    #[tokio::test]
    async fn test_upload_sends_attachment_field_and_downloads() {
        let (mock, api) = setup();
        let part = Part::with_pk(&api, 1).await.expect("part");

        let file = UploadFile::from_bytes("file", "notes.txt", b"hello".to_vec());
        let attachment = part.upload_attachment(file, "").await.expect("upload");

        let upload = mock
            .requests()
            .into_iter()
            .find(|r| r.endpoint == "attachment/")
            .expect("upload request");
        assert_eq!(upload.files, vec!["attachment:notes.txt".to_string()]);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = attachment.download(dir.path(), false).await.expect("download");
        assert_eq!(path, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
    }

    #[tokio::test]
    async fn test_attachments_need_api_207() {
        let (mock, _) = setup();
        let api: SharedClient = Arc::new(mock.with_api_version(206));
        let part = Part::with_pk(&api, 1).await.expect("part");

        let err = part.get_attachments().await.expect_err("too old");
        assert!(matches!(err, InvenTreeError::UnsupportedModel { .. }));
    }
}
