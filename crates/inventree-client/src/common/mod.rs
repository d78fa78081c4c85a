//! Common types for the InvenTree API client
//!
//! Wire-level request/response types shared by the real HTTP client and the
//! in-memory mock.

pub mod query;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HttpErrorDetail, InvenTreeError};

/// Api version from which the generic `/print/` endpoints replace the
/// per-model legacy print endpoints
pub const MODERN_PRINTING_API_VERSION: u32 = 201;

/// HTTP verbs supported by the InvenTree API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read
    Get,
    /// Create
    Post,
    /// Full update
    Put,
    /// Partial update
    Patch,
    /// Remove
    Delete,
    /// Endpoint metadata
    Options,
}

impl Method {
    /// Uppercase verb name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// A file attached to a multipart request
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Form field name (e.g. "attachment", "image", "template")
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    /// Wrap in-memory contents
    pub fn from_bytes(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file; the handle is closed before this returns
    pub async fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, InvenTreeError> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Err(InvenTreeError::FileNotFound(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "filename".to_string());

        Ok(Self::from_bytes(field, file_name, bytes))
    }
}

/// A single call against the API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP verb
    pub method: Method,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// JSON body (sent as form fields when files are attached)
    pub json: Option<Value>,
    /// Multipart file parts
    pub files: Vec<UploadFile>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Per-request timeout override
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Create an empty request for the given verb
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: Vec::new(),
            json: None,
            files: Vec::new(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    /// Append query parameters
    pub fn params(mut self, params: &[(&str, &str)]) -> Self {
        self.params
            .extend(params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        self
    }

    /// Append a single query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a free-text search term
    pub fn search(self, term: impl Into<String>) -> Self {
        self.param("search", term)
    }

    /// Set the JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Attach files (switches the body to multipart)
    pub fn files(mut self, files: Vec<UploadFile>) -> Self {
        self.files = files;
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the timeout for this request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw response returned by [`crate::InvenTreeClientTrait::request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Fully qualified URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Content type header, if any
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

impl ApiResponse {
    /// Build a JSON response
    pub fn json(url: impl Into<String>, status: u16, value: &Value) -> Self {
        Self {
            url: url.into(),
            status,
            content_type: Some("application/json".to_string()),
            body: value.to_string(),
        }
    }

    /// True for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON; an empty body decodes as `null`
    pub fn parse_json(&self) -> Result<Value, InvenTreeError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&self.body).map_err(|source| InvenTreeError::InvalidJson {
            url: self.url.clone(),
            source,
        })
    }
}

/// Apply the status and content-type rules shared by every transport
///
/// Status codes of 300 and above become [`InvenTreeError::Api`] carrying the
/// request context. DELETE responses are passed through untouched; anything
/// else must be exactly `application/json`.
pub fn check_response(request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, InvenTreeError> {
    if response.status >= 300 {
        return Err(InvenTreeError::Api(Box::new(HttpErrorDetail {
            detail: "Error occurred during API request".to_string(),
            url: response.url,
            method: request.method.to_string(),
            status_code: response.status,
            body: response.body,
            params: request.params.clone(),
            data: request.json.clone(),
            files: request.files.iter().map(|f| f.file_name.clone()).collect(),
        })));
    }

    // A delete request won't return JSON formatted data
    if request.method == Method::Delete {
        return Ok(response);
    }

    if response.content_type.as_deref() != Some("application/json") {
        return Err(InvenTreeError::ContentType {
            url: response.url,
            content_type: response.content_type.unwrap_or_default(),
        });
    }

    Ok(response)
}

/// List endpoints answer either with a bare array or a paginated envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    /// `{"count": N, "next": ..., "previous": ..., "results": [...]}`
    Paginated {
        /// Total number of matching records on the server
        #[serde(default)]
        count: Option<u64>,
        /// URL of the next page
        #[serde(default)]
        next: Option<String>,
        /// URL of the previous page
        #[serde(default)]
        previous: Option<String>,
        /// Records on this page
        results: Vec<Value>,
    },
    /// `[...]`
    Bare(Vec<Value>),
}

impl ListResponse {
    /// Total reported by the server (array length for bare responses)
    pub fn count(&self) -> u64 {
        match self {
            Self::Paginated { count, results, .. } => count.unwrap_or(results.len() as u64),
            Self::Bare(items) => items.len() as u64,
        }
    }

    /// Unwrap the records regardless of response shape
    pub fn into_results(self) -> Vec<Value> {
        match self {
            Self::Paginated { results, .. } => results,
            Self::Bare(items) => items,
        }
    }
}

/// Which generation of the label/report printing API the server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintProtocol {
    /// Per-model print endpoints returning the rendered file directly
    Legacy,
    /// Generic `/print/` endpoint returning an output descriptor
    Modern,
}

impl PrintProtocol {
    /// Select the protocol for a server api version
    pub fn for_api_version(api_version: u32) -> Self {
        if api_version >= MODERN_PRINTING_API_VERSION {
            Self::Modern
        } else {
            Self::Legacy
        }
    }
}

/// Strip a leading slash and ensure a trailing one
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_start_matches('/');
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Join an endpoint onto the api root (which ends with a slash)
pub fn construct_api_url(api_url: &str, endpoint: &str) -> String {
    format!("{}{}", api_url, normalize_endpoint(endpoint))
}

/// Resolve a download URL against the server base URL
pub fn construct_download_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}{}", base_url, url.trim_start_matches('/'))
    }
}

/// True for media paths that legitimately render as HTML (report and label output)
pub fn html_download_allowed(url: &str) -> bool {
    let path = url.trim_start_matches('/');
    path.starts_with("media/report") || path.starts_with("media/label")
}

/// Work out where a download should be written
///
/// A directory destination gets the remote file name appended. An existing
/// file is only accepted when `overwrite` is set.
pub async fn resolve_download_destination(
    url: &str,
    destination: &Path,
    overwrite: bool,
) -> Result<PathBuf, InvenTreeError> {
    let mut target = destination.to_path_buf();

    if tokio::fs::metadata(&target).await.map(|m| m.is_dir()).unwrap_or(false) {
        let remote = url.split('?').next().unwrap_or(url).trim_end_matches('/');
        let name = remote.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("download");
        target = target.join(name);
    }

    if tokio::fs::try_exists(&target).await? && !overwrite {
        return Err(InvenTreeError::FileExists(target));
    }

    Ok(target)
}

/// Flatten a JSON object into multipart text fields
pub fn form_fields(body: Option<&Value>) -> Vec<(String, String)> {
    match body {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// True when a JSON value carries no data (null, `{}` or `[]`)
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Convert a JSON value into an object map, rejecting other shapes
pub fn into_object(value: Value, url: &str) -> Result<Map<String, Value>, InvenTreeError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(InvenTreeError::InvalidArgument(format!(
            "Expected a JSON object from '{}', found {}",
            url, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_construct_api_url_normalizes_slashes() {
        let api = "http://inventree.local/api/";
        assert_eq!(construct_api_url(api, "/part/5"), "http://inventree.local/api/part/5/");
        assert_eq!(construct_api_url(api, "part/5/"), "http://inventree.local/api/part/5/");
        assert_eq!(construct_api_url(api, "//stock/"), "http://inventree.local/api/stock/");
    }

    #[test]
    fn test_download_url_resolution() {
        let base = "http://inventree.local/";
        assert_eq!(
            construct_download_url(base, "/media/attachments/a.pdf"),
            "http://inventree.local/media/attachments/a.pdf"
        );
        assert_eq!(
            construct_download_url(base, "https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_list_response_shapes() {
        let enveloped: ListResponse =
            serde_json::from_value(json!({"count": 7, "next": null, "previous": null, "results": [{"pk": 1}]}))
                .expect("envelope");
        let bare: ListResponse = serde_json::from_value(json!([{"pk": 1}])).expect("bare");

        let results_only: ListResponse =
            serde_json::from_value(json!({"results": [{"pk": 1}]})).expect("results only");

        assert_eq!(enveloped.count(), 7);
        assert_eq!(bare.count(), 1);
        assert_eq!(results_only.count(), 1);
        assert_eq!(results_only.into_results(), vec![json!({"pk": 1})]);
        assert_eq!(enveloped.into_results(), bare.into_results());
    }

    #[test]
    fn test_print_protocol_selection() {
        assert_eq!(PrintProtocol::for_api_version(130), PrintProtocol::Legacy);
        assert_eq!(PrintProtocol::for_api_version(201), PrintProtocol::Modern);
        assert_eq!(PrintProtocol::for_api_version(300), PrintProtocol::Modern);
    }

    #[test]
    fn test_form_fields_stringify_values() {
        let fields = form_fields(Some(&json!({"comment": "hello", "model_id": 4, "skip": null})));
        assert!(fields.contains(&("comment".to_string(), "hello".to_string())));
        assert!(fields.contains(&("model_id".to_string(), "4".to_string())));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_html_allowed_only_for_rendered_media() {
        assert!(html_download_allowed("media/report/output.html"));
        assert!(html_download_allowed("/media/label/output.html"));
        assert!(!html_download_allowed("media/attachments/a.pdf"));
    }

    #[test]
    fn test_empty_body_parses_as_null() {
        let response = ApiResponse {
            url: "http://x/api/part/1/".to_string(),
            status: 204,
            content_type: None,
            body: String::new(),
        };
        assert_eq!(response.parse_json().expect("empty body"), Value::Null);
    }

    #[test]
    fn test_check_response_maps_status_and_content_type() {
        let get = ApiRequest::new(Method::Get).param("limit", "1");

        let missing = ApiResponse::json("http://x/api/part/99/", 404, &json!({"detail": "Not found."}));
        let err = check_response(&get, missing).expect_err("404 is an error");
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("http://x/api/part/99/"));

        let html = ApiResponse {
            url: "http://x/api/part/".to_string(),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: "<html></html>".to_string(),
        };
        let err = check_response(&get, html.clone()).expect_err("html is not data");
        assert!(matches!(err, InvenTreeError::ContentType { .. }));

        let delete = ApiRequest::new(Method::Delete);
        assert!(check_response(&delete, html).is_ok());
    }

    #[tokio::test]
    async fn test_resolve_destination_refuses_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("part.png");
        tokio::fs::write(&file, b"original").await.expect("write");

        let err = resolve_download_destination("media/part.png", &file, false)
            .await
            .expect_err("existing file must be refused");
        assert!(matches!(err, InvenTreeError::FileExists(_)));

        let ok = resolve_download_destination("media/part.png", &file, true)
            .await
            .expect("overwrite allowed");
        assert_eq!(ok, file);
    }

    #[tokio::test]
    async fn test_resolve_destination_directory_appends_remote_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = resolve_download_destination("media/images/widget.jpg", dir.path(), false)
            .await
            .expect("directory destination");
        assert_eq!(target, dir.path().join("widget.jpg"));
    }
}
