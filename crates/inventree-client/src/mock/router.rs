//! Request routing for the mock server
//!
//! Paths are resolved against the longest registered collection prefix:
//! `{collection}/` is the list endpoint, `{collection}/{pk}/` a record,
//! `{collection}/{pk}/metadata/` its metadata and any other
//! `{collection}/{pk}/{action}/` a POST-only action.

use serde_json::{Map, Value, json};

use super::MockState;
use super::store::key_string;
use crate::common::{ApiRequest, ApiResponse, Method, UploadFile};

/// Canned binary served by `download_file`
#[derive(Debug, Clone)]
pub(crate) struct Download {
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

impl MockState {
    pub(crate) fn route(&mut self, url: &str, path: &str, request: &ApiRequest) -> ApiResponse {
        let Some(collection) = self.resolve_collection(path) else {
            return not_found(url);
        };

        let rest: Vec<&str> = path[collection.len()..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match rest.as_slice() {
            [] => self.collection_request(url, &collection, request),
            [pk] => self.detail_request(url, &collection, pk, request),
            [pk, "metadata"] => self.metadata_request(url, &collection, pk, request),
            [pk, _action] => match request.method {
                Method::Post if self.exists(&collection, pk) => ApiResponse::json(url, 201, &json!({})),
                Method::Post => not_found(url),
                _ => method_not_allowed(url, request.method),
            },
            _ => not_found(url),
        }
    }

    fn resolve_collection(&self, path: &str) -> Option<String> {
        self.collections
            .keys()
            .filter(|name| path == name.as_str() || path.starts_with(&format!("{}/", name)))
            .max_by_key(|name| name.len())
            .cloned()
    }

    fn exists(&self, collection: &str, pk: &str) -> bool {
        self.collections
            .get(collection)
            .is_some_and(|c| c.find(pk).is_some())
    }

    fn collection_request(&mut self, url: &str, name: &str, request: &ApiRequest) -> ApiResponse {
        let paginate = self.paginate;
        let Some(collection) = self.collections.get_mut(name) else {
            return not_found(url);
        };

        match request.method {
            Method::Get => {
                let records = collection.filter(&request.params);
                let total = records.len();

                let param = |key: &str| -> Option<usize> {
                    request
                        .params
                        .iter()
                        .find(|(k, _)| k == key)
                        .and_then(|(_, v)| v.parse().ok())
                };
                let offset = param("offset").unwrap_or(0);
                let limit = param("limit");

                let page: Vec<Value> = records
                    .into_iter()
                    .skip(offset)
                    .take(limit.unwrap_or(usize::MAX))
                    .map(Value::Object)
                    .collect();

                if paginate || limit.is_some() {
                    ApiResponse::json(
                        url,
                        200,
                        &json!({ "count": total, "next": null, "previous": null, "results": page }),
                    )
                } else {
                    ApiResponse::json(url, 200, &Value::Array(page))
                }
            }
            Method::Post => {
                let mut record = body_object(request);
                attach_files(&mut self.downloads, &mut record, &request.files);

                let pk_field = collection.pk_field.clone();
                match collection.upsert(record) {
                    Some(stored) => ApiResponse::json(url, 201, &Value::Object(stored)),
                    None => {
                        let mut errors = Map::new();
                        errors.insert(pk_field, json!(["This field is required."]));
                        ApiResponse::json(url, 400, &Value::Object(errors))
                    }
                }
            }
            Method::Delete => {
                let body = body_object(request);
                if body.is_empty() {
                    return method_not_allowed(url, request.method);
                }

                let mut keys: Vec<String> = body
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(key_string).collect())
                    .unwrap_or_default();

                if let Some(Value::Object(filters)) = body.get("filters") {
                    let params: Vec<(String, String)> = filters
                        .iter()
                        .map(|(k, v)| (k.clone(), key_string(v).unwrap_or_else(|| v.to_string())))
                        .collect();
                    keys.extend(collection.filter(&params).iter().filter_map(|r| collection.key_of(r)));
                }

                for key in keys {
                    collection.remove(&key);
                }

                no_content(url)
            }
            Method::Options => ApiResponse::json(url, 200, &collection.options()),
            method => method_not_allowed(url, method),
        }
    }

    fn detail_request(&mut self, url: &str, name: &str, pk: &str, request: &ApiRequest) -> ApiResponse {
        let Some(collection) = self.collections.get_mut(name) else {
            return not_found(url);
        };
        let pk_field = collection.pk_field.clone();

        if request.method == Method::Options {
            return ApiResponse::json(url, 200, &collection.options());
        }

        let Some(record) = collection.find_mut(pk) else {
            return not_found(url);
        };

        match request.method {
            Method::Get => ApiResponse::json(url, 200, &Value::Object(record.clone())),
            Method::Patch | Method::Put => {
                let mut update = body_object(request);
                update.remove(&pk_field);
                attach_files(&mut self.downloads, &mut update, &request.files);

                if request.method == Method::Put {
                    let key = record.get(&pk_field).cloned().unwrap_or(Value::Null);
                    record.clear();
                    record.insert(pk_field, key);
                }
                record.extend(update);

                ApiResponse::json(url, 200, &Value::Object(record.clone()))
            }
            Method::Delete => {
                collection.remove(pk);
                no_content(url)
            }
            method => method_not_allowed(url, method),
        }
    }

    fn metadata_request(&mut self, url: &str, name: &str, pk: &str, request: &ApiRequest) -> ApiResponse {
        if !self.exists(name, pk) {
            return not_found(url);
        }
        let Some(collection) = self.collections.get_mut(name) else {
            return not_found(url);
        };

        let stored = collection.metadata.entry(pk.to_string()).or_default();
        let incoming = match body_object(request).remove("metadata") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        match request.method {
            Method::Get => {}
            Method::Put => *stored = incoming,
            Method::Patch => stored.extend(incoming),
            method => return method_not_allowed(url, method),
        }

        ApiResponse::json(url, 200, &json!({ "metadata": stored.clone() }))
    }
}

fn body_object(request: &ApiRequest) -> Map<String, Value> {
    match &request.json {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// Uploaded files become media URLs served back by `download_file`
fn attach_files(
    downloads: &mut std::collections::HashMap<String, Download>,
    record: &mut Map<String, Value>,
    files: &[UploadFile],
) {
    for file in files {
        let media = format!("media/{}/{}", file.field, file.file_name);
        downloads.insert(
            media.clone(),
            Download {
                content_type: "application/octet-stream".to_string(),
                bytes: file.bytes.clone(),
            },
        );
        record.insert(file.field.clone(), Value::from(format!("/{}", media)));
    }
}

fn not_found(url: &str) -> ApiResponse {
    ApiResponse::json(url, 404, &json!({ "detail": "Not found." }))
}

fn method_not_allowed(url: &str, method: Method) -> ApiResponse {
    ApiResponse::json(url, 405, &json!({ "detail": format!("Method \"{}\" not allowed.", method) }))
}

fn no_content(url: &str) -> ApiResponse {
    ApiResponse {
        url: url.to_string(),
        status: 204,
        content_type: None,
        body: String::new(),
    }
}
