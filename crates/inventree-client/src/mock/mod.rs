//! Mock InvenTreeClient for unit testing
//!
//! This module provides an in-memory InvenTree server implementing
//! [`InvenTreeClientTrait`], so model proxies can be exercised without a
//! running instance. Responses go through the same status and content-type
//! checks as the real client.
//!
//! The mock is organized into:
//! - `store.rs` - collections and their records
//! - `router.rs` - mapping of endpoints onto collection, record, metadata
//!   and action handlers

mod router;
mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::common::{
    ApiRequest, ApiResponse, Method, PrintProtocol, check_response, html_download_allowed, normalize_endpoint,
    resolve_download_destination,
};
use crate::error::{HttpErrorDetail, InvenTreeError};
use crate::inventree_trait::InvenTreeClientTrait;

use router::Download;
use store::Collection;

/// Api version reported unless overridden
pub const DEFAULT_MOCK_API_VERSION: u32 = 300;

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP verb
    pub method: Method,
    /// Endpoint below `/api/` (normalized), or the download URL
    pub endpoint: String,
    /// Query parameters in request order
    pub params: Vec<(String, String)>,
    /// JSON body (form fields for multipart requests)
    pub json: Option<Value>,
    /// Uploaded files as `field:file_name`
    pub files: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub(crate) collections: HashMap<String, Collection>,
    pub(crate) stubs: Vec<(Method, String, ApiResponse)>,
    pub(crate) downloads: HashMap<String, Download>,
    pub(crate) requests: Vec<RecordedRequest>,
    pub(crate) paginate: bool,
}

/// Mock InvenTreeClient for testing
///
/// Clones share the same server state; the api version and print protocol
/// are per handle so one store can be viewed as different server versions.
#[derive(Clone)]
pub struct MockInvenTreeClient {
    base_url: String,
    api_version: u32,
    print_protocol: PrintProtocol,
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockInvenTreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockInvenTreeClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("print_protocol", &self.print_protocol)
            .finish()
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn collection_name(collection: &str) -> String {
    collection.trim_matches('/').to_string()
}

impl MockInvenTreeClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = format!("{}/", base_url.trim_end_matches('/'));

        Self {
            base_url,
            api_version: DEFAULT_MOCK_API_VERSION,
            print_protocol: PrintProtocol::for_api_version(DEFAULT_MOCK_API_VERSION),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Report a different api version (the print protocol follows it)
    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self.print_protocol = PrintProtocol::for_api_version(api_version);
        self
    }

    /// Force a print protocol regardless of api version
    pub fn with_print_protocol(mut self, print_protocol: PrintProtocol) -> Self {
        self.print_protocol = print_protocol;
        self
    }

    /// Make a collection endpoint exist (empty)
    pub fn register(&self, collection: &str) {
        self.register_with_pk(collection, "pk");
    }

    /// Make a collection endpoint exist with a custom key field
    pub fn register_with_pk(&self, collection: &str, pk_field: &str) {
        lock(&self.state)
            .collections
            .entry(collection_name(collection))
            .or_insert_with(|| Collection::new(pk_field));
    }

    /// Store a record (for test setup), assigning a `pk` when missing
    ///
    /// Returns the stored record, or `Value::Null` if the collection needs a
    /// text key that was not supplied.
    pub fn insert(&self, collection: &str, record: Value) -> Value {
        let Value::Object(record) = record else {
            return Value::Null;
        };

        let mut state = lock(&self.state);
        state
            .collections
            .entry(collection_name(collection))
            .or_insert_with(|| Collection::new("pk"))
            .upsert(record)
            .map(Value::Object)
            .unwrap_or(Value::Null)
    }

    /// Current state of a stored record
    pub fn record(&self, collection: &str, pk: impl ToString) -> Option<Value> {
        let state = lock(&self.state);
        let collection = state.collections.get(&collection_name(collection))?;
        collection.find(&pk.to_string()).cloned().map(Value::Object)
    }

    /// All records of a collection, in insertion order
    pub fn records(&self, collection: &str) -> Vec<Value> {
        lock(&self.state)
            .collections
            .get(&collection_name(collection))
            .map(|c| c.records.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Always answer list requests with a paginated envelope
    pub fn set_paginate(&self, paginate: bool) {
        lock(&self.state).paginate = paginate;
    }

    /// Override the OPTIONS descriptor of a collection
    pub fn set_options(&self, collection: &str, options: Value) {
        let mut state = lock(&self.state);
        let name = collection_name(collection);
        state
            .collections
            .entry(name)
            .or_insert_with(|| Collection::new("pk"))
            .options = Some(options);
    }

    /// Answer `method endpoint` with a fixed JSON body
    pub fn stub(&self, method: Method, endpoint: &str, status: u16, body: Value) {
        let url = format!("{}api/{}", self.base_url, normalize_endpoint(endpoint));
        self.stub_response(method, endpoint, ApiResponse::json(url, status, &body));
    }

    /// Answer `method endpoint` with a raw response; the latest stub wins
    pub fn stub_response(&self, method: Method, endpoint: &str, response: ApiResponse) {
        lock(&self.state)
            .stubs
            .push((method, normalize_endpoint(endpoint), response));
    }

    /// Serve a file from `download_file`
    pub fn add_download(&self, url: &str, content_type: &str, bytes: Vec<u8>) {
        lock(&self.state).downloads.insert(
            url.trim_start_matches('/').to_string(),
            Download {
                content_type: content_type.to_string(),
                bytes,
            },
        );
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.state).requests.last().cloned()
    }

    /// Latest request against an endpoint
    pub fn last_request_to(&self, endpoint: &str) -> Option<RecordedRequest> {
        let endpoint = normalize_endpoint(endpoint);
        lock(&self.state)
            .requests
            .iter()
            .rev()
            .find(|r| r.endpoint == endpoint)
            .cloned()
    }

    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }
}

#[async_trait::async_trait]
impl InvenTreeClientTrait for MockInvenTreeClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn print_protocol(&self) -> PrintProtocol {
        self.print_protocol
    }

    async fn request(&self, endpoint: &str, request: ApiRequest) -> Result<ApiResponse, InvenTreeError> {
        let path = normalize_endpoint(endpoint);
        let url = format!("{}api/{}", self.base_url, path);

        let response = {
            let mut state = lock(&self.state);
            state.requests.push(RecordedRequest {
                method: request.method,
                endpoint: path.clone(),
                params: request.params.clone(),
                json: request.json.clone(),
                files: request
                    .files
                    .iter()
                    .map(|f| format!("{}:{}", f.field, f.file_name))
                    .collect(),
            });

            let stub = state
                .stubs
                .iter()
                .rev()
                .find(|(method, stub_path, _)| *method == request.method && *stub_path == path)
                .map(|(_, _, response)| response.clone());

            match stub {
                Some(response) => response,
                None => state.route(&url, path.trim_end_matches('/'), &request),
            }
        };

        debug!("Mock request: {} {} - {}", request.method, url, response.status);
        check_response(&request, response)
    }

    async fn download_file(
        &self,
        url: &str,
        destination: &Path,
        overwrite: bool,
        params: &[(String, String)],
    ) -> Result<PathBuf, InvenTreeError> {
        let key = url.trim_start_matches('/').to_string();

        let download = {
            let mut state = lock(&self.state);
            state.requests.push(RecordedRequest {
                method: Method::Get,
                endpoint: key.clone(),
                params: params.to_vec(),
                json: None,
                files: Vec::new(),
            });
            state.downloads.get(&key).cloned()
        };

        let full_url = format!("{}{}", self.base_url, key);
        let Some(download) = download else {
            return Err(InvenTreeError::Api(Box::new(HttpErrorDetail {
                detail: "Error downloading file".to_string(),
                url: full_url,
                method: Method::Get.to_string(),
                status_code: 404,
                body: String::new(),
                params: params.to_vec(),
                data: None,
                files: Vec::new(),
            })));
        };

        if download.content_type.contains("text/html") && !html_download_allowed(&key) {
            return Err(InvenTreeError::ContentType {
                url: full_url,
                content_type: download.content_type,
            });
        }

        let target = resolve_download_destination(&key, destination, overwrite).await?;
        tokio::fs::write(&target, &download.bytes).await?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mock() -> MockInvenTreeClient {
        let mock = MockInvenTreeClient::new("http://inventree.local");
        mock.insert("part", json!({"pk": 1, "name": "Widget", "active": true}));
        mock.insert("part", json!({"pk": 2, "name": "Gadget", "active": false}));
        mock
    }

    #[tokio::test]
    async fn test_list_shapes() {
        let mock = mock();

        let bare = mock.get("part", &[("active", "true")]).await.expect("list");
        assert_eq!(bare.as_array().map(Vec::len), Some(1));

        let page = mock.get("part", &[("limit", "1"), ("offset", "1")]).await.expect("page");
        assert_eq!(page["count"], json!(2));
        assert_eq!(page["results"][0]["name"], json!("Gadget"));
    }

    #[tokio::test]
    async fn test_detail_verbs() {
        let mock = mock();

        let patched = mock.patch("part/1/", json!({"name": "Widget 2"})).await.expect("patch");
        assert_eq!(patched["name"], json!("Widget 2"));
        assert_eq!(patched["active"], json!(true));

        let replaced = mock.put("part/1/", json!({"name": "Widget 3"})).await.expect("put");
        assert_eq!(replaced, json!({"pk": 1, "name": "Widget 3"}));

        mock.delete("part/1/").await.expect("delete");
        let err = mock.get("part/1/", &[]).await.expect_err("gone");
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_not_found() {
        let mock = mock();
        let err = mock.get("no-such-thing/", &[]).await.expect_err("unknown");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stub_html_is_rejected() {
        let mock = mock();
        mock.stub_response(
            Method::Get,
            "part/",
            ApiResponse {
                url: "http://inventree.local/api/part/".to_string(),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: "<html></html>".to_string(),
            },
        );

        let err = mock.get("part", &[]).await.expect_err("html");
        assert!(matches!(err, InvenTreeError::ContentType { .. }));
    }

    #[tokio::test]
    async fn test_metadata_merge_and_replace() {
        let mock = mock();

        mock.patch("part/2/metadata/", json!({"metadata": {"a": 1}})).await.expect("patch");
        mock.patch("part/2/metadata/", json!({"metadata": {"b": 2}})).await.expect("patch");
        let merged = mock.get("part/2/metadata/", &[]).await.expect("get");
        assert_eq!(merged, json!({"metadata": {"a": 1, "b": 2}}));

        mock.put("part/2/metadata/", json!({"metadata": {"c": 3}})).await.expect("put");
        let replaced = mock.get("part/2/metadata/", &[]).await.expect("get");
        assert_eq!(replaced, json!({"metadata": {"c": 3}}));
    }
}
