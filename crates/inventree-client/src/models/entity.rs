//! Generic proxy over a single server-side record
//!
//! An [`Entity`] holds the record's field mapping as returned by the server
//! and mediates every read and write through the shared transport. Per-model
//! behaviour is selected by the [`Model`] marker type parameter.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::common::{ApiRequest, ListResponse, Method, UploadFile, into_object, normalize_endpoint};
use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;

/// Declared type of a model's primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkKind {
    /// Positive integer id (the default `pk` field)
    Integer,
    /// Free text key (e.g. plugin `key`)
    Text,
}

/// Static description of an entity type
///
/// Implemented by zero-sized marker types; see [`crate::models`] for the
/// full set.
pub trait Model: Send + Sync + 'static {
    /// Collection endpoint below `/api/`
    const URL: &'static str;
    /// Human readable model name used in errors and logs
    const NAME: &'static str;
    /// Server-side model type identifier (attachments, printing, barcodes)
    const MODEL_TYPE: Option<&'static str> = None;
    /// Name of the primary key field in a record
    const PK_FIELD: &'static str = "pk";
    /// Declared primary key type
    const PK_KIND: PkKind = PkKind::Integer;
    /// Oldest server api version exposing this model
    const MIN_API_VERSION: Option<u32> = None;
    /// Newest server api version exposing this model
    const MAX_API_VERSION: Option<u32> = None;

    /// Collection endpoint with a trailing slash
    fn collection_url() -> String {
        normalize_endpoint(Self::URL)
    }

    /// Detail endpoint for a primary key
    fn detail_url(pk: &PrimaryKey) -> String {
        format!("{}{}/", Self::collection_url(), pk)
    }
}

/// Check the connected server's api version against a model's window
pub fn check_api_version<M: Model>(api_version: u32) -> Result<(), InvenTreeError> {
    if let Some(min) = M::MIN_API_VERSION
        && api_version < min
    {
        return Err(InvenTreeError::UnsupportedModel {
            model: M::NAME,
            api_version,
            requirement: format!("requires API version >= {}", min),
        });
    }

    if let Some(max) = M::MAX_API_VERSION
        && api_version > max
    {
        return Err(InvenTreeError::UnsupportedModel {
            model: M::NAME,
            api_version,
            requirement: format!("requires API version <= {}", max),
        });
    }

    Ok(())
}

/// Primary key of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    /// Integer id
    Id(u64),
    /// Text key
    Key(String),
}

impl PrimaryKey {
    /// Coerce a raw value to the key type declared by `M`
    ///
    /// Integer keys accept numbers and numeric strings (surrounding
    /// whitespace is ignored) and must be positive.
    pub fn coerce<M: Model>(value: &Value) -> Result<Self, InvenTreeError> {
        let invalid = || InvenTreeError::InvalidPrimaryKey {
            model: M::NAME,
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };

        match M::PK_KIND {
            PkKind::Integer => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|_| i64::MAX)),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };

                match (parsed, value) {
                    (None, _) => Err(invalid()),
                    (Some(v), _) if v <= 0 => Err(InvenTreeError::NonPositivePrimaryKey { model: M::NAME, value: v }),
                    // Ids beyond i64 are still valid u64 ids
                    (Some(_), Value::Number(n)) => n.as_u64().map(Self::Id).ok_or_else(invalid),
                    (Some(v), _) => u64::try_from(v).map(Self::Id).map_err(|_| invalid()),
                }
            }
            PkKind::Text => match value {
                Value::String(s) if !s.trim().is_empty() => Ok(Self::Key(s.trim().to_string())),
                Value::Number(n) => Ok(Self::Key(n.to_string())),
                _ => Err(invalid()),
            },
        }
    }

    /// Integer id, if this is one
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Key(_) => None,
        }
    }

    /// JSON form of the key, as sent in request bodies
    pub fn to_value(&self) -> Value {
        match self {
            Self::Id(id) => Value::from(*id),
            Self::Key(key) => Value::from(key.as_str()),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<u64> for PrimaryKey {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for PrimaryKey {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// Update semantics for [`Entity::save_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMethod {
    /// Partial update
    #[default]
    Patch,
    /// Full overwrite
    Put,
}

impl From<SaveMethod> for Method {
    fn from(method: SaveMethod) -> Self {
        match method {
            SaveMethod::Patch => Method::Patch,
            SaveMethod::Put => Method::Put,
        }
    }
}

/// Lightweight (model type, primary key) handle to a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Server-side model type (e.g. "part", "stockitem")
    pub model_type: String,
    /// Primary key within that model
    pub pk: PrimaryKey,
}

impl EntityRef {
    /// Fetch the referenced record as a typed entity
    ///
    /// Fails with [`InvenTreeError::InvalidArgument`] when `M` declares a
    /// different model type.
    pub async fn resolve<M: Model>(&self, api: &SharedClient) -> Result<Entity<M>, InvenTreeError> {
        if let Some(model_type) = M::MODEL_TYPE
            && model_type != self.model_type
        {
            return Err(InvenTreeError::InvalidArgument(format!(
                "Reference to '{}' cannot be resolved as {}",
                self.model_type,
                M::NAME
            )));
        }

        Entity::<M>::with_pk(api, self.pk.to_value()).await
    }
}

/// Proxy for one record of model `M`
pub struct Entity<M: Model> {
    api: SharedClient,
    pk: PrimaryKey,
    url: String,
    data: Map<String, Value>,
    _model: PhantomData<M>,
}

impl<M: Model> Clone for Entity<M> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            pk: self.pk.clone(),
            url: self.url.clone(),
            data: self.data.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(M::NAME)
            .field("pk", &self.pk)
            .field("url", &self.url)
            .field("data", &self.data)
            .finish()
    }
}

impl<M: Model> fmt::Display for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}={}>", M::NAME, M::PK_FIELD, self.pk)
    }
}

impl<M: Model> Entity<M> {
    /// Construct a proxy from a primary key, a record, or both
    ///
    /// The key is taken from `data` when not given explicitly. When no data
    /// (or an empty record) is supplied the record is fetched immediately.
    pub async fn new(api: &SharedClient, pk: Option<Value>, data: Option<Map<String, Value>>) -> Result<Self, InvenTreeError> {
        check_api_version::<M>(api.api_version())?;

        let data = data.unwrap_or_default();
        let raw_pk = match pk {
            Some(pk) if !pk.is_null() => pk,
            _ => data.get(M::PK_FIELD).cloned().unwrap_or(Value::Null),
        };

        if raw_pk.is_null() {
            return Err(InvenTreeError::MissingPrimaryKey(M::NAME));
        }

        let pk = PrimaryKey::coerce::<M>(&raw_pk)?;
        let mut entity = Self::from_parts(api.clone(), pk, data);

        if entity.data.is_empty() {
            entity.reload().await?;
        }

        Ok(entity)
    }

    /// Fetch a record by primary key
    pub async fn with_pk(api: &SharedClient, pk: impl Into<Value>) -> Result<Self, InvenTreeError> {
        Self::new(api, Some(pk.into()), None).await
    }

    /// Wrap a record that has already been fetched
    pub async fn from_data(api: &SharedClient, data: Map<String, Value>) -> Result<Self, InvenTreeError> {
        Self::new(api, None, Some(data)).await
    }

    fn from_parts(api: SharedClient, pk: PrimaryKey, data: Map<String, Value>) -> Self {
        Self {
            url: M::detail_url(&pk),
            api,
            pk,
            data,
            _model: PhantomData,
        }
    }

    /// List records at the model's collection endpoint
    ///
    /// Both bare array and paginated envelope responses are accepted. Raw
    /// records without a primary key are skipped.
    pub async fn list(api: &SharedClient, filters: &[(&str, &str)]) -> Result<Vec<Self>, InvenTreeError> {
        Self::list_at(api, &M::collection_url(), filters).await
    }

    /// List records at a custom collection URL
    pub async fn list_at(api: &SharedClient, url: &str, filters: &[(&str, &str)]) -> Result<Vec<Self>, InvenTreeError> {
        check_api_version::<M>(api.api_version())?;

        let response = api.get(url, filters).await?;
        if response.is_null() {
            return Ok(Vec::new());
        }

        let listing: ListResponse = serde_json::from_value(response)?;

        let mut items = Vec::new();
        for record in listing.into_results() {
            let Value::Object(data) = record else {
                continue;
            };

            let Some(raw_pk) = data.get(M::PK_FIELD).filter(|v| !v.is_null()) else {
                debug!("Skipping {} record without '{}' field", M::NAME, M::PK_FIELD);
                continue;
            };

            let pk = PrimaryKey::coerce::<M>(raw_pk)?;
            items.push(Self::from_parts(api.clone(), pk, data));
        }

        Ok(items)
    }

    /// Number of records matching the filters, as reported by the server
    pub async fn count(api: &SharedClient, filters: &[(&str, &str)]) -> Result<u64, InvenTreeError> {
        check_api_version::<M>(api.api_version())?;

        // A single result is enough to get the total
        let mut params: Vec<(&str, &str)> = filters.iter().copied().filter(|(k, _)| *k != "limit").collect();
        params.push(("limit", "1"));

        let response = api.get(&M::collection_url(), &params).await?;

        let listing: ListResponse = serde_json::from_value(response)?;
        Ok(listing.count())
    }

    /// Create a new record
    pub async fn create(api: &SharedClient, data: Map<String, Value>) -> Result<Self, InvenTreeError> {
        Self::create_with_files(api, data, Vec::new()).await
    }

    /// Create a new record, uploading files alongside the data
    ///
    /// Any primary key in `data` is removed so an existing record cannot be
    /// updated by accident.
    pub async fn create_with_files(
        api: &SharedClient,
        mut data: Map<String, Value>,
        files: Vec<UploadFile>,
    ) -> Result<Self, InvenTreeError> {
        check_api_version::<M>(api.api_version())?;

        data.remove(M::PK_FIELD);

        let response = api
            .write(
                &M::collection_url(),
                ApiRequest::new(Method::Post).json(Value::Object(data)).files(files),
            )
            .await
            .inspect_err(|e| error!("Error creating new {} object: {}", M::NAME, e))?;

        let record = into_object(response, M::URL)?;
        Self::from_data(api, record).await
    }

    /// Create a new record on servers at or above `min_api_version`
    pub async fn create_checked(
        api: &SharedClient,
        data: Map<String, Value>,
        files: Vec<UploadFile>,
        min_api_version: u32,
    ) -> Result<Self, InvenTreeError> {
        let api_version = api.api_version();
        if api_version < min_api_version {
            return Err(InvenTreeError::UnsupportedModel {
                model: M::NAME,
                api_version,
                requirement: format!("creating requires API version >= {}", min_api_version),
            });
        }

        Self::create_with_files(api, data, files).await
    }

    /// OPTIONS metadata for the collection endpoint
    pub async fn options(api: &SharedClient) -> Result<Value, InvenTreeError> {
        check_api_version::<M>(api.api_version())?;
        api.options(&M::collection_url()).await
    }

    /// Writable fields reported by the OPTIONS request
    pub async fn fields(api: &SharedClient) -> Result<Map<String, Value>, InvenTreeError> {
        let options = Self::options(api).await?;
        Ok(options
            .get("actions")
            .and_then(|a| a.get("POST"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }

    /// Metadata for a single field (an empty object if the field is unknown)
    pub async fn field_info(api: &SharedClient, field_name: &str) -> Result<Value, InvenTreeError> {
        let mut fields = Self::fields(api).await?;
        match fields.remove(field_name) {
            Some(info) => Ok(info),
            None => {
                warn!("Field '{}' not found in OPTIONS request for {}", field_name, M::URL);
                Ok(Value::Object(Map::new()))
            }
        }
    }

    /// Names of the writable fields
    pub async fn field_names(api: &SharedClient) -> Result<Vec<String>, InvenTreeError> {
        Ok(Self::fields(api).await?.into_iter().map(|(k, _)| k).collect())
    }

    /// PATCH the whole cached record back to the server
    pub async fn save(&mut self) -> Result<Value, InvenTreeError> {
        self.save_with(None, Vec::new(), SaveMethod::Patch).await
    }

    /// Write to the server and adopt its response as the new record
    ///
    /// With `data` omitted the entire cached record is sent. An empty
    /// response triggers a reload. On failure the record is re-fetched
    /// before the error is returned.
    pub async fn save_with(
        &mut self,
        data: Option<Map<String, Value>>,
        files: Vec<UploadFile>,
        method: SaveMethod,
    ) -> Result<Value, InvenTreeError> {
        check_api_version::<M>(self.api.api_version())?;

        let body = data.unwrap_or_else(|| self.data.clone());
        let request = ApiRequest::new(method.into()).json(Value::Object(body)).files(files);

        match self.api.write(&self.url, request).await {
            Ok(Value::Object(record)) if !record.is_empty() => {
                self.data = record.clone();
                Ok(Value::Object(record))
            }
            Ok(response) => {
                self.reload().await?;
                Ok(response)
            }
            Err(e) => {
                warn!("Save failed at {}, reloading: {}", self.url, e);
                if let Err(reload_err) = self.reload().await {
                    error!("Error during reload at {}: {}", self.url, reload_err);
                }
                Err(e)
            }
        }
    }

    /// Re-fetch the record from the server
    pub async fn reload(&mut self) -> Result<(), InvenTreeError> {
        check_api_version::<M>(self.api.api_version())?;

        let response = self.api.get(&self.url, &[]).await?;
        if response.is_null() {
            self.data = Map::new();
            error!("Error during reload at {}", self.url);
            return Ok(());
        }

        self.data = into_object(response, &self.url)?;

        if !self.is_valid() {
            error!("Error during reload at {} - returned data is invalid", self.url);
        }

        Ok(())
    }

    /// Delete the record; the proxy is consumed
    pub async fn delete(self) -> Result<(), InvenTreeError> {
        check_api_version::<M>(self.api.api_version())?;
        self.api.delete(&self.url).await
    }

    /// True when the record holds data from the server
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }

    /// Primary key
    pub fn pk(&self) -> &PrimaryKey {
        &self.pk
    }

    /// Integer primary key (models with text keys return `None`)
    pub fn id(&self) -> Option<u64> {
        self.pk.as_id()
    }

    /// Detail endpoint of this record
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Transport this record is bound to
    pub fn api(&self) -> &SharedClient {
        &self.api
    }

    /// Cached record
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Take the cached record
    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    /// Field value, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Field value; a missing field is an error rather than `None`
    pub fn field(&self, name: &str) -> Result<&Value, InvenTreeError> {
        self.data
            .get(name)
            .ok_or_else(|| InvenTreeError::KeyNotFound(name.to_string()))
    }

    /// Replace the value of an existing field
    ///
    /// Only fields already in the record can be set; use
    /// [`Entity::save_with`] to send new ones.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), InvenTreeError> {
        match self.data.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(InvenTreeError::KeyNotFound(name.to_string())),
        }
    }

    /// Field names in the cached record
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// True when the record has this field
    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// String field
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Unsigned integer field (numeric strings are accepted)
    pub fn u64_field(&self, name: &str) -> Option<u64> {
        match self.data.get(name)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point field (quantities and prices may arrive as strings)
    pub fn f64_field(&self, name: &str) -> Option<f64> {
        match self.data.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean field
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.data.get(name).and_then(Value::as_bool)
    }

    /// Deserialize a field into a concrete type
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, InvenTreeError> {
        let value = self.field(name)?.clone();
        Ok(serde_json::from_value(value)?)
    }

    /// Handle to this record
    pub fn reference(&self) -> EntityRef {
        EntityRef {
            model_type: M::MODEL_TYPE.unwrap_or(M::NAME).to_string(),
            pk: self.pk.clone(),
        }
    }

    /// Follow a primary key field to the record it points at
    ///
    /// Returns `None` when the field is missing or null. The related record
    /// is always fetched fresh.
    pub async fn related<R: Model>(&self, field: &str) -> Result<Option<Entity<R>>, InvenTreeError> {
        match self.data.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(pk) => Entity::<R>::with_pk(&self.api, pk.clone()).await.map(Some),
        }
    }

    /// Follow a required primary key field
    pub async fn related_required<R: Model>(&self, field: &str) -> Result<Entity<R>, InvenTreeError> {
        self.related::<R>(field)
            .await?
            .ok_or_else(|| InvenTreeError::KeyNotFound(field.to_string()))
    }

    /// List records of `R` whose `field` filter points at this record
    pub async fn children<R: Model>(&self, field: &str, filters: &[(&str, &str)]) -> Result<Vec<Entity<R>>, InvenTreeError> {
        let pk = self.pk.to_string();
        let mut params: Vec<(&str, &str)> = vec![(field, pk.as_str())];
        params.extend(filters.iter().filter(|(k, _)| *k != field));
        Entity::<R>::list(&self.api, &params).await
    }

    /// POST to a sub-endpoint of this record (e.g. `{url}/{pk}/receive/`)
    pub async fn post_action(&self, action: &str, data: Value) -> Result<Value, InvenTreeError> {
        let url = format!("{}{}/", self.url, action.trim_matches('/'));
        self.api.post(&url, data).await
    }

    /// Download a file referenced by a field of this record
    pub async fn download_field(&self, field: &str, destination: &Path, overwrite: bool) -> Result<PathBuf, InvenTreeError> {
        let url = self
            .str_field(field)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| InvenTreeError::KeyNotFound(field.to_string()))?;
        self.api.download_file(url, destination, overwrite, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Widget;

    impl Model for Widget {
        const URL: &'static str = "widget";
        const NAME: &'static str = "Widget";
    }

    struct Keyed;

    impl Model for Keyed {
        const URL: &'static str = "keyed/";
        const NAME: &'static str = "Keyed";
        const PK_FIELD: &'static str = "key";
        const PK_KIND: PkKind = PkKind::Text;
        const MIN_API_VERSION: Option<u32> = Some(197);
        const MAX_API_VERSION: Option<u32> = Some(300);
    }

    #[test]
    fn test_integer_pk_coercion() {
        assert_eq!(PrimaryKey::coerce::<Widget>(&json!(5)).expect("int"), PrimaryKey::Id(5));
        assert_eq!(PrimaryKey::coerce::<Widget>(&json!(" 12 ")).expect("string"), PrimaryKey::Id(12));
    }

    #[test]
    fn test_integer_pk_rejects_non_numeric_and_non_positive() {
        for bad in [json!("abc"), json!(1.5), json!(true), json!([1])] {
            let err = PrimaryKey::coerce::<Widget>(&bad).expect_err("not an integer");
            assert!(matches!(err, InvenTreeError::InvalidPrimaryKey { model: "Widget", .. }), "{bad}");
        }

        for bad in [json!(0), json!(-3), json!("-1")] {
            let err = PrimaryKey::coerce::<Widget>(&bad).expect_err("not positive");
            assert!(matches!(err, InvenTreeError::NonPositivePrimaryKey { .. }), "{bad}");
        }
    }

    #[test]
    fn test_text_pk_coercion() {
        assert_eq!(
            PrimaryKey::coerce::<Keyed>(&json!("inventree-bom")).expect("key"),
            PrimaryKey::Key("inventree-bom".to_string())
        );
        assert!(PrimaryKey::coerce::<Keyed>(&json!("")).is_err());
    }

    #[test]
    fn test_urls_are_normalized() {
        assert_eq!(Widget::collection_url(), "widget/");
        assert_eq!(Widget::detail_url(&PrimaryKey::Id(3)), "widget/3/");
        assert_eq!(Keyed::detail_url(&PrimaryKey::from("abc")), "keyed/abc/");
    }

    #[test]
    fn test_api_version_window() {
        assert!(check_api_version::<Widget>(1).is_ok());
        assert!(check_api_version::<Keyed>(197).is_ok());
        assert!(check_api_version::<Keyed>(300).is_ok());

        let err = check_api_version::<Keyed>(150).expect_err("too old");
        assert!(matches!(err, InvenTreeError::UnsupportedModel { model: "Keyed", api_version: 150, .. }));
        assert!(check_api_version::<Keyed>(301).is_err());
    }

    mod against_mock {
        use super::*;
        use crate::mock::MockInvenTreeClient;
        use std::sync::Arc;

        fn setup() -> (MockInvenTreeClient, SharedClient) {
            let mock = MockInvenTreeClient::new("http://inventree.local");
            mock.insert("widget", json!({"pk": 1, "name": "Sprocket", "colour": "red", "stock": 4}));
            mock.insert("widget", json!({"pk": 2, "name": "Cog", "colour": "blue", "stock": 0}));
            mock.insert("widget", json!({"name": "Gear", "colour": "red", "stock": 9}));
            let api: SharedClient = Arc::new(mock.clone());
            (mock, api)
        }

        #[tokio::test]
        async fn test_list_ignores_response_shape() {
            let (mock, api) = setup();

            let bare = Entity::<Widget>::list(&api, &[("colour", "red")]).await.expect("bare");
            mock.set_paginate(true);
            let paged = Entity::<Widget>::list(&api, &[("colour", "red")]).await.expect("envelope");

            let data = |items: &[Entity<Widget>]| items.iter().map(|w| w.data().clone()).collect::<Vec<_>>();
            assert_eq!(bare.len(), 2);
            assert_eq!(data(&bare), data(&paged));
            assert_eq!(Entity::<Widget>::count(&api, &[("colour", "red")]).await.expect("count"), 2);
        }

        #[tokio::test]
        async fn test_create_then_fetch() {
            let (_mock, api) = setup();

            let mut data = Map::new();
            data.insert("pk".to_string(), json!(1));
            data.insert("name".to_string(), json!("Flange"));
            data.insert("colour".to_string(), json!("green"));

            let created = Entity::<Widget>::create(&api, data).await.expect("create");
            assert_eq!(created.id(), Some(4));

            let fetched = Entity::<Widget>::with_pk(&api, 4).await.expect("fetch");
            assert_eq!(created.data(), fetched.data());
            assert_eq!(fetched.to_string(), "Widget<pk=4>");
        }

        #[tokio::test]
        async fn test_save_then_reload_does_not_drift() {
            let (mock, api) = setup();
            let mut widget = Entity::<Widget>::with_pk(&api, 1).await.expect("fetch");

            widget.set("colour", "yellow").expect("known field");
            widget.save().await.expect("save");
            let saved = widget.data().clone();

            widget.reload().await.expect("reload");
            assert_eq!(widget.data(), &saved);
            widget.reload().await.expect("reload again");
            assert_eq!(widget.data(), &saved);
            assert_eq!(mock.record("widget", 1).expect("stored")["colour"], json!("yellow"));
        }

        #[tokio::test]
        async fn test_set_unknown_field() {
            let (_mock, api) = setup();
            let mut widget = Entity::<Widget>::with_pk(&api, 2).await.expect("fetch");

            let err = widget.set("weight", 5).expect_err("not in record");
            assert!(matches!(err, InvenTreeError::KeyNotFound(ref k) if k == "weight"));
            assert!(matches!(widget.field("weight"), Err(InvenTreeError::KeyNotFound(_))));
            assert_eq!(widget.u64_field("stock"), Some(0));
        }

        #[tokio::test]
        async fn test_failed_save_resyncs_and_raises() {
            let (mock, api) = setup();
            mock.stub(Method::Patch, "widget/1/", 400, json!({"name": ["This field may not be blank."]}));
            let mut widget = Entity::<Widget>::with_pk(&api, 1).await.expect("fetch");

            widget.set("name", "").expect("known field");
            let err = widget.save().await.expect_err("rejected");
            assert_eq!(err.status_code(), Some(400));
            assert_eq!(widget.str_field("name"), Some("Sprocket"));
        }

        #[tokio::test]
        async fn test_empty_reload_invalidates() {
            let (mock, api) = setup();
            let mut widget = Entity::<Widget>::with_pk(&api, 1).await.expect("fetch");
            assert!(widget.is_valid());

            mock.stub_response(
                Method::Get,
                "widget/1/",
                crate::common::ApiResponse {
                    url: "http://inventree.local/api/widget/1/".to_string(),
                    status: 200,
                    content_type: Some("application/json".to_string()),
                    body: String::new(),
                },
            );

            widget.reload().await.expect("empty body is not an error");
            assert!(!widget.is_valid());
            assert!(widget.get("name").is_none());
        }

        #[tokio::test]
        async fn test_list_skips_records_without_key() {
            let (mock, api) = setup();
            let records = json!([
                {"pk": 1, "name": "Sprocket"},
                {"name": "Loose"},
                {"pk": null, "name": "Null key"},
                {"pk": 2, "name": "Cog"},
            ]);

            mock.stub(Method::Get, "widget/", 200, records.clone());
            let bare = Entity::<Widget>::list(&api, &[]).await.expect("bare");
            assert_eq!(bare.iter().map(|w| w.id()).collect::<Vec<_>>(), vec![Some(1), Some(2)]);

            mock.stub(
                Method::Get,
                "widget/",
                200,
                json!({"count": 4, "next": null, "previous": null, "results": records}),
            );
            let paged = Entity::<Widget>::list(&api, &[]).await.expect("envelope");
            assert_eq!(paged.iter().map(|w| w.id()).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
        }

        #[tokio::test]
        async fn test_delete_consumes_and_removes() {
            let (mock, api) = setup();
            let widget = Entity::<Widget>::with_pk(&api, 2).await.expect("fetch");

            widget.delete().await.expect("delete");
            assert!(mock.record("widget", 2).is_none());

            let err = Entity::<Widget>::with_pk(&api, 2).await.expect_err("gone");
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn test_construction_rules() {
            let (mock, api) = setup();

            let err = Entity::<Widget>::new(&api, None, None).await.expect_err("no key");
            assert!(matches!(err, InvenTreeError::MissingPrimaryKey("Widget")));

            mock.clear_requests();
            let mut data = Map::new();
            data.insert("pk".to_string(), json!("7"));
            data.insert("name".to_string(), json!("Unsaved"));
            let widget = Entity::<Widget>::from_data(&api, data).await.expect("wrap");
            assert_eq!(widget.pk(), &PrimaryKey::Id(7));
            assert!(mock.requests().is_empty());

            let err = Entity::<Widget>::with_pk(&api, 0).await.expect_err("not positive");
            assert!(matches!(err, InvenTreeError::NonPositivePrimaryKey { .. }));
        }

        #[tokio::test]
        async fn test_field_introspection() {
            let (mock, api) = setup();
            mock.set_options(
                "widget",
                json!({"actions": {"POST": {
                    "name": {"type": "string", "required": true, "max_length": 100},
                    "colour": {"type": "choice", "required": false},
                }}}),
            );

            let mut names = Entity::<Widget>::field_names(&api).await.expect("names");
            names.sort();
            assert_eq!(names, vec!["colour", "name"]);

            let name = Entity::<Widget>::field_info(&api, "name").await.expect("info");
            assert_eq!(name["max_length"], json!(100));
            assert_eq!(Entity::<Widget>::field_info(&api, "nope").await.expect("info"), json!({}));
        }

        #[tokio::test]
        async fn test_reference_round_trip() {
            let (_mock, api) = setup();
            let widget = Entity::<Widget>::with_pk(&api, 1).await.expect("fetch");

            let reference = widget.reference();
            assert_eq!(reference.model_type, "Widget");
            let resolved = reference.resolve::<Widget>(&api).await.expect("resolve");
            assert_eq!(resolved.data(), widget.data());
        }
    }
}
