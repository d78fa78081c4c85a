//! Bulk deletion against a collection endpoint

use serde_json::{Map, Value};

use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::models::{Entity, Model, check_api_version};

/// Models whose collection endpoint accepts DELETE with an item list or filters
pub trait BulkDelete: Model {}

impl<M: BulkDelete> Entity<M> {
    /// Delete many records in one request
    ///
    /// Either explicit primary keys, server-side filters, or both must be
    /// supplied.
    pub async fn bulk_delete(
        api: &SharedClient,
        items: &[u64],
        filters: Option<Map<String, Value>>,
    ) -> Result<(), InvenTreeError> {
        check_api_version::<M>(api.api_version())?;

        let filters = filters.filter(|f| !f.is_empty());
        if items.is_empty() && filters.is_none() {
            return Err(InvenTreeError::InvalidArgument(
                "Must supply either 'items' or 'filters' argument".to_string(),
            ));
        }

        let mut body = Map::new();
        if !items.is_empty() {
            body.insert("items".to_string(), Value::from(items.to_vec()));
        }
        if let Some(filters) = filters {
            body.insert("filters".to_string(), Value::Object(filters));
        }

        api.delete_with(&M::collection_url(), Some(Value::Object(body))).await
    }
}
