//! InvenTreeClient trait for mocking
//!
//! This trait abstracts the transport so that model proxies can run against
//! the real HTTP client or against [`crate::MockInvenTreeClient`] in tests.
//! Only `request` and `download_file` touch the network; the verb wrappers
//! are provided on top of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::common::{ApiRequest, ApiResponse, Method, PrintProtocol, UploadFile};
use crate::error::InvenTreeError;

/// Shared handle to a transport, held by every entity proxy
pub type SharedClient = Arc<dyn InvenTreeClientTrait>;

/// Trait for InvenTree API transport operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InvenTreeClientTrait: Send + Sync {
    /// Server base URL (ends with a slash)
    fn base_url(&self) -> &str;

    /// Api version reported by the server at connect time
    fn api_version(&self) -> u32;

    /// Printing protocol selected at connect time
    fn print_protocol(&self) -> PrintProtocol;

    /// Perform a request against an endpoint below `/api/`
    ///
    /// Status codes of 300 and above are returned as [`InvenTreeError::Api`].
    /// DELETE responses are returned as-is; any other response must be
    /// `application/json` or [`InvenTreeError::ContentType`] is returned.
    async fn request(&self, endpoint: &str, request: ApiRequest) -> Result<ApiResponse, InvenTreeError>;

    /// Stream a file from the server to a local path, returning the final path
    async fn download_file(
        &self,
        url: &str,
        destination: &Path,
        overwrite: bool,
        params: &[(String, String)],
    ) -> Result<PathBuf, InvenTreeError>;

    /// GET an endpoint and decode the JSON body
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, InvenTreeError> {
        let response = self
            .request(endpoint, ApiRequest::new(Method::Get).params(params))
            .await?;
        response.parse_json()
    }

    /// POST a JSON body
    async fn post(&self, endpoint: &str, data: Value) -> Result<Value, InvenTreeError> {
        self.write(endpoint, ApiRequest::new(Method::Post).json(data)).await
    }

    /// POST a body with file attachments
    async fn post_files(&self, endpoint: &str, data: Value, files: Vec<UploadFile>) -> Result<Value, InvenTreeError> {
        self.write(endpoint, ApiRequest::new(Method::Post).json(data).files(files))
            .await
    }

    /// PUT a JSON body (full update)
    async fn put(&self, endpoint: &str, data: Value) -> Result<Value, InvenTreeError> {
        self.write(endpoint, ApiRequest::new(Method::Put).json(data)).await
    }

    /// PATCH a JSON body (partial update)
    async fn patch(&self, endpoint: &str, data: Value) -> Result<Value, InvenTreeError> {
        self.write(endpoint, ApiRequest::new(Method::Patch).json(data)).await
    }

    /// Perform a write request and decode the response
    ///
    /// Any non-2xx status is a failure; the `format=json` hint is always sent.
    async fn write(&self, endpoint: &str, request: ApiRequest) -> Result<Value, InvenTreeError> {
        let method = request.method;
        let response = self.request(endpoint, request.param("format", "json")).await?;
        if !response.is_success() {
            return Err(unexpected_status(&response, method));
        }
        response.parse_json()
    }

    /// DELETE an endpoint
    async fn delete(&self, endpoint: &str) -> Result<(), InvenTreeError> {
        self.delete_with(endpoint, None).await
    }

    /// DELETE an endpoint with an optional JSON body (bulk deletion)
    async fn delete_with(&self, endpoint: &str, data: Option<Value>) -> Result<(), InvenTreeError> {
        let mut request = ApiRequest::new(Method::Delete);
        if let Some(data) = data {
            request = request.json(data);
        }

        let response = self.request(endpoint, request).await?;
        if !response.is_success() {
            return Err(unexpected_status(&response, Method::Delete));
        }

        debug!("DELETE request at '{}' returned: {}", response.url, response.status);
        Ok(())
    }

    /// OPTIONS request describing the fields of an endpoint
    async fn options(&self, endpoint: &str) -> Result<Value, InvenTreeError> {
        let response = self.request(endpoint, ApiRequest::new(Method::Options)).await?;
        response.parse_json()
    }

    /// Ask the server to match arbitrary barcode data against known objects
    async fn scan_barcode(&self, barcode_data: &str) -> Result<Value, InvenTreeError> {
        self.post("barcode/", json!({ "barcode": barcode_data })).await
    }
}

fn unexpected_status(response: &ApiResponse, method: Method) -> InvenTreeError {
    InvenTreeError::Api(Box::new(crate::error::HttpErrorDetail {
        detail: "Unexpected status code for write request".to_string(),
        url: response.url.clone(),
        method: method.to_string(),
        status_code: response.status,
        body: response.body.clone(),
        params: Vec::new(),
        data: None,
        files: Vec::new(),
    }))
}
