//! InvenTree API client
//!
//! Implements the transport against a live InvenTree server using reqwest.
//! Connecting validates the server, checks its api version and
//! authenticates before any model operation is attempted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::common::query::append_query;
use crate::common::{
    ApiRequest, ApiResponse, Method, PrintProtocol, check_response, construct_api_url, construct_download_url,
    form_fields, html_download_allowed, resolve_download_destination,
};
use crate::config::ClientConfig;
use crate::error::{HttpErrorDetail, InvenTreeError};
use crate::inventree_trait::InvenTreeClientTrait;

/// How requests are authenticated once connected
#[derive(Clone)]
enum Auth {
    Basic { username: String, password: String },
    Token(String),
}

/// InvenTree API client
pub struct InvenTreeClient {
    client: Client,
    config: ClientConfig,
    base_url: String,
    api_url: String,
    auth: Auth,
    username: Option<String>,
    server_details: Value,
    api_version: u32,
    print_protocol: PrintProtocol,
}

impl std::fmt::Debug for InvenTreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvenTreeClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("print_protocol", &self.print_protocol)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl InvenTreeClient {
    /// Connect to an InvenTree server
    ///
    /// This method:
    /// 1. Validates the host address
    /// 2. Checks the server at `/api/` and its api version
    /// 3. Verifies the credentials against `/api/user/me/`
    /// 4. Requests a token when token auth is enabled and none was supplied
    ///
    /// # Returns
    /// * `Ok(InvenTreeClient)` - Connected, authenticated client
    /// * `Err(InvenTreeError)` - Server unreachable, incompatible, or credentials rejected
    pub async fn connect(config: ClientConfig) -> Result<Self, InvenTreeError> {
        let (base_url, api_url) = config.server_urls()?;

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.strict);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        let client = builder.build()?;

        let credentials = config.credentials.clone();
        let auth = match (&credentials.token, &credentials.username, &credentials.password) {
            (Some(token), _, _) => Auth::Token(token.clone()),
            (None, Some(username), Some(password)) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => {
                return Err(InvenTreeError::Authentication(
                    "Supply a token, or username and password".to_string(),
                ));
            }
        };

        let mut api = Self {
            client,
            username: credentials.username.clone(),
            config,
            base_url,
            api_url,
            auth,
            server_details: Value::Null,
            api_version: 0,
            print_protocol: PrintProtocol::Legacy,
        };

        info!("Connecting to server: {}", api.base_url);
        api.test_server().await?;
        api.test_auth().await?;

        if api.config.use_token_auth && matches!(api.auth, Auth::Basic { .. }) {
            let token = api.request_token().await?;
            api.auth = Auth::Token(token);
        }

        Ok(api)
    }

    /// Server details reported at `/api/`
    pub fn server_details(&self) -> &Value {
        &self.server_details
    }

    /// Authenticated username (looked up from the server when a token was supplied)
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Active token, if token auth is in use
    pub fn token(&self) -> Option<&str> {
        match &self.auth {
            Auth::Token(token) => Some(token),
            Auth::Basic { .. } => None,
        }
    }

    /// Fully qualified URL for an endpoint below `/api/`
    pub fn construct_api_url(&self, endpoint: &str) -> String {
        construct_api_url(&self.api_url, endpoint)
    }

    /// Check that the server is present and compatible
    ///
    /// The `/api/` root does not require authentication.
    async fn test_server(&mut self) -> Result<(), InvenTreeError> {
        info!("Checking InvenTree server connection...");

        let response = self
            .client
            .get(&self.api_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| send_error(e, &self.api_url, Method::Get, self.config.timeout))?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if status != 200 {
            return Err(InvenTreeError::Api(Box::new(HttpErrorDetail {
                detail: "Error code from server".to_string(),
                url: self.api_url.clone(),
                method: Method::Get.to_string(),
                status_code: status,
                body,
                params: Vec::new(),
                data: None,
                files: Vec::new(),
            })));
        }

        let details: Value = serde_json::from_str(&body).map_err(|source| InvenTreeError::InvalidJson {
            url: self.api_url.clone(),
            source,
        })?;

        info!("InvenTree server details: {}", body);

        let server_name = details.get("server").and_then(Value::as_str).unwrap_or_default();
        if !server_name.eq_ignore_ascii_case("inventree") {
            warn!(
                "Server returned strange response (expected 'InvenTree', found '{}')",
                server_name
            );
        }

        let api_version = parse_api_version(details.get("apiVersion"))?;
        if api_version < self.config.min_api_version {
            return Err(InvenTreeError::IncompatibleServer {
                found: api_version,
                required: self.config.min_api_version,
            });
        }

        self.api_version = api_version;
        self.print_protocol = PrintProtocol::for_api_version(api_version);
        self.server_details = details;
        Ok(())
    }

    /// Verify the configured credentials
    async fn test_auth(&mut self) -> Result<(), InvenTreeError> {
        info!("Checking InvenTree user credentials");

        let me = match self.get("user/me/", &[]).await {
            Ok(me) => me,
            Err(InvenTreeError::Api(detail)) => {
                error!("Authentication error: {} {}", detail.status_code, detail.url);
                return Err(InvenTreeError::Authentication(format!(
                    "Authentication at InvenTree server failed ({})",
                    detail.status_code
                )));
            }
            Err(e) => return Err(e),
        };

        if self.username.is_none() {
            self.username = me.get("username").and_then(Value::as_str).map(str::to_string);
        }

        Ok(())
    }

    /// Request an authentication token using basic auth
    async fn request_token(&self) -> Result<String, InvenTreeError> {
        if !self.config.credentials.has_basic() {
            return Err(InvenTreeError::Authentication(
                "Supply username and password to request token".to_string(),
            ));
        }

        info!("Requesting auth token from server...");

        let response = self
            .get("user/token/", &[("name", self.config.token_name.as_str())])
            .await
            .map_err(|e| {
                error!("Error requesting token: {}", e);
                InvenTreeError::Authentication(format!("Token request failed: {}", e))
            })?;

        match response.get("token").and_then(Value::as_str) {
            Some(token) => {
                debug!("Authentication token received");
                Ok(token.to_string())
            }
            None => Err(InvenTreeError::Authentication(format!(
                "Token not returned by server: {}",
                response
            ))),
        }
    }

    /// Attach credentials to a request
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Token(token) => builder.header("Authorization", format!("Token {}", token)),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }
}

#[async_trait::async_trait]
impl InvenTreeClientTrait for InvenTreeClient {
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
        let url = self.construct_api_url(endpoint);
        let method = request.method;
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let full_url = append_query(&url, &request.params);

        debug!("Sending Request:");
        debug!(" - URL: {} {}", method, full_url);
        if let Some(body) = &request.json {
            debug!(" - json: {}", body);
        }

        let mut builder = self
            .client
            .request(method.into(), &full_url)
            .header("Accept", "application/json")
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = self.authorize(builder);

        // Files cannot travel in a JSON body
        if !request.files.is_empty() {
            let mut form = Form::new();
            for (name, value) in form_fields(request.json.as_ref()) {
                form = form.text(name, value);
            }
            for file in &request.files {
                debug!(" - file: {} ({} bytes)", file.file_name, file.bytes.len());
                let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                form = form.part(file.field.clone(), part);
            }
            builder = builder.multipart(form);
        } else if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("Error at api.request - {} @ {}", method, url);
            send_error(e, &url, method, timeout)
        })?;

        let status = response.status().as_u16();
        info!("Request: {} {} - {}", method, url, status);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        check_response(
            &request,
            ApiResponse {
                url,
                status,
                content_type,
                body,
            },
        )
    }

    async fn download_file(
        &self,
        url: &str,
        destination: &Path,
        overwrite: bool,
        params: &[(String, String)],
    ) -> Result<PathBuf, InvenTreeError> {
        let full_url = construct_download_url(&self.base_url, url);
        let destination = resolve_download_destination(&full_url, destination, overwrite).await?;

        debug!("Downloading {} to {}", full_url, destination.display());

        let builder = self.client.get(append_query(&full_url, params));
        let mut response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| send_error(e, &full_url, Method::Get, self.config.timeout))?;

        let status = response.status().as_u16();
        if status >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(InvenTreeError::Api(Box::new(HttpErrorDetail {
                detail: "Error occurred during file download".to_string(),
                url: full_url,
                method: Method::Get.to_string(),
                status_code: status,
                body,
                params: params.to_vec(),
                data: None,
                files: Vec::new(),
            })));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        // An HTML page here is usually a login redirect, not the file
        if content_type.contains("text/html") && !html_download_allowed(url) {
            error!("Error downloading file '{}': Server return invalid response (text/html)", url);
            return Err(InvenTreeError::ContentType {
                url: full_url,
                content_type,
            });
        }

        let mut file = tokio::fs::File::create(&destination).await?;
        if let Err(e) = write_body(&mut response, &mut file).await {
            drop(file);
            error!("Download of '{}' failed: {}", url, e);
            if let Err(remove_err) = tokio::fs::remove_file(&destination).await {
                warn!("Could not remove partial file '{}': {}", destination.display(), remove_err);
            }
            return Err(e);
        }

        info!("Downloaded '{}' to '{}'", url, destination.display());
        Ok(destination)
    }
}

/// Stream a response body into an open file
async fn write_body(response: &mut reqwest::Response, file: &mut tokio::fs::File) -> Result<(), InvenTreeError> {
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Map a reqwest send failure onto the error taxonomy
fn send_error(e: reqwest::Error, url: &str, method: Method, timeout: Duration) -> InvenTreeError {
    if e.is_timeout() {
        error!(
            "Server timed out during api.request - {} @ {}. Timeout {:?}.",
            method, url, timeout
        );
        InvenTreeError::Timeout {
            url: url.to_string(),
            method: method.to_string(),
            timeout,
        }
    } else if e.is_connect() {
        error!("Server connection error: {}", e);
        InvenTreeError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        }
    } else {
        InvenTreeError::Http(e)
    }
}

/// Parse `apiVersion`, which servers report as a number or a string
///
/// A missing value is treated as version 1.
pub(crate) fn parse_api_version(value: Option<&Value>) -> Result<u32, InvenTreeError> {
    match value {
        None | Some(Value::Null) => Ok(1),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| InvenTreeError::InvalidApiVersion(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| InvenTreeError::InvalidApiVersion(s.clone())),
        Some(other) => Err(InvenTreeError::InvalidApiVersion(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_api_version_accepts_number_and_string() {
        assert_eq!(parse_api_version(Some(&json!(210))).expect("number"), 210);
        assert_eq!(parse_api_version(Some(&json!(" 207 "))).expect("string"), 207);
        assert_eq!(parse_api_version(None).expect("missing"), 1);
    }

    #[test]
    fn test_parse_api_version_rejects_garbage() {
        let err = parse_api_version(Some(&json!("v2.1"))).expect_err("not an integer");
        assert!(matches!(err, InvenTreeError::InvalidApiVersion(v) if v == "v2.1"));

        let err = parse_api_version(Some(&json!(-4))).expect_err("negative");
        assert!(matches!(err, InvenTreeError::InvalidApiVersion(_)));
    }

    #[tokio::test]
    async fn test_connect_requires_credentials() {
        let err = InvenTreeClient::connect(ClientConfig::new("http://127.0.0.1:9"))
            .await
            .expect_err("credentials are required");
        assert!(matches!(err, InvenTreeError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_host() {
        let err = InvenTreeClient::connect(ClientConfig::new("not a url").with_token("abc"))
            .await
            .expect_err("host must be a URL");
        assert!(matches!(err, InvenTreeError::InvalidConfig(_)));
    }
}
