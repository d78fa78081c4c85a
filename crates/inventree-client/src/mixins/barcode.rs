//! Barcode assignment and scanning

use serde_json::{Map, Value};

use crate::error::InvenTreeError;
use crate::inventree_trait::SharedClient;
use crate::models::{Entity, EntityRef, Model, PrimaryKey};

/// Models that can carry a custom barcode
pub trait Barcode: Model {
    /// Key used for this model in the `barcode/link/` payload
    const BARCODE_MODEL_TYPE: &'static str;
}

impl<M: Barcode> Entity<M> {
    /// Assign arbitrary barcode data to this record
    pub async fn assign_barcode(&mut self, barcode_data: &str, reload: bool) -> Result<Value, InvenTreeError> {
        let mut body = Map::new();
        body.insert("barcode".to_string(), Value::from(barcode_data));
        body.insert(M::BARCODE_MODEL_TYPE.to_string(), self.pk().to_value());

        let response = self.api().post("barcode/link/", Value::Object(body)).await?;

        if reload {
            self.reload().await?;
        }

        Ok(response)
    }

    /// Remove the barcode assigned to this record
    pub async fn unassign_barcode(&mut self, reload: bool) -> Result<Value, InvenTreeError> {
        let mut body = Map::new();
        body.insert(M::BARCODE_MODEL_TYPE.to_string(), self.pk().to_value());

        let response = self.api().post("barcode/unlink/", Value::Object(body)).await?;

        if reload {
            self.reload().await?;
        }

        Ok(response)
    }
}

/// Scan barcode data and resolve it to the record it identifies
///
/// Returns `None` when the server found no match.
pub async fn scan_barcode(api: &SharedClient, barcode_data: &str) -> Result<Option<EntityRef>, InvenTreeError> {
    let response = api.scan_barcode(barcode_data).await?;
    Ok(match_from_scan(&response))
}

/// First object in a scan response that carries a `pk`
fn match_from_scan(response: &Value) -> Option<EntityRef> {
    let fields = response.as_object()?;

    fields.iter().find_map(|(model_type, value)| {
        let pk = match value.get("pk")? {
            Value::Number(n) => PrimaryKey::Id(n.as_u64()?),
            Value::String(s) => PrimaryKey::Key(s.clone()),
            _ => return None,
        };

        Some(EntityRef {
            model_type: model_type.clone(),
            pk,
        })
    })
}
