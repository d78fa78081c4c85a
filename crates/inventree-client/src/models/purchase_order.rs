//! Purchase orders and their line items

use serde_json::{Map, Value, json};

use super::{Company, Contact, Model, Part, SupplierPart, model, order_status_helpers};
use crate::error::InvenTreeError;
use crate::mixins::{Attachments, Metadata, ReportPrinting, Status};

/// Stock status code for received items that are OK
pub const STOCK_STATUS_OK: u64 = 10;

model! {
    /// Purchase order
    PurchaseOrder(PurchaseOrderModel) => "order/po", model_type = "purchaseorder"
}

model! {
    /// Purchase order line (a supplier part and quantity)
    PurchaseOrderLineItem(PurchaseOrderLineItemModel) => "order/po-line"
}

model! {
    /// Purchase order line not tied to a part (e.g. shipping)
    PurchaseOrderExtraLineItem(PurchaseOrderExtraLineItemModel) => "order/po-extra-line"
}

impl Metadata for PurchaseOrderModel {}
impl Metadata for PurchaseOrderLineItemModel {}
impl Metadata for PurchaseOrderExtraLineItemModel {}
impl Attachments for PurchaseOrderModel {}
impl Status for PurchaseOrderModel {}

impl ReportPrinting for PurchaseOrderModel {
    const REPORT_NAME: &'static str = "po";
    const REPORT_ITEM: &'static str = "order";
}

order_status_helpers!(PurchaseOrder);

/// Options for receiving a purchase order line
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveOptions {
    /// Quantity to receive; defaults to everything outstanding
    pub quantity: Option<f64>,
    /// Stock status code for the received items
    pub status: u64,
    /// Destination location; defaults to the line's destination
    pub location: Option<u64>,
    /// Expiry date of the received stock
    pub expiry_date: Option<chrono::NaiveDate>,
    /// Batch code of the received stock
    pub batch_code: Option<String>,
    /// Serial numbers of the received stock
    pub serial_numbers: Option<String>,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            quantity: None,
            status: STOCK_STATUS_OK,
            location: None,
            expiry_date: None,
            batch_code: None,
            serial_numbers: None,
        }
    }
}

impl PurchaseOrder {
    /// The supplier company
    pub async fn supplier(&self) -> Result<Company, InvenTreeError> {
        self.related_required("supplier").await
    }

    /// The supplier contact, if set
    pub async fn contact(&self) -> Result<Option<Contact>, InvenTreeError> {
        self.related("contact").await
    }

    /// Line items of this order
    pub async fn line_items(&self, filters: &[(&str, &str)]) -> Result<Vec<PurchaseOrderLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Extra line items of this order
    pub async fn extra_line_items(
        &self,
        filters: &[(&str, &str)],
    ) -> Result<Vec<PurchaseOrderExtraLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Create a line item against this order
    pub async fn add_line_item(&self, mut data: Map<String, Value>) -> Result<PurchaseOrderLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        PurchaseOrderLineItem::create(self.api(), data).await
    }

    /// Create an extra line item against this order
    pub async fn add_extra_line_item(
        &self,
        mut data: Map<String, Value>,
    ) -> Result<PurchaseOrderExtraLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        PurchaseOrderExtraLineItem::create(self.api(), data).await
    }

    /// Receive every outstanding line into a location
    ///
    /// Lines with a saved destination may be placed there instead. Returns
    /// `None` when nothing is left to receive.
    pub async fn receive_all(&mut self, location: u64, status: u64) -> Result<Option<Value>, InvenTreeError> {
        let mut items = Vec::new();
        for line in self.line_items(&[]).await? {
            let outstanding = line.outstanding();
            if outstanding > 0.0 {
                items.push(json!({
                    "line_item": line.pk().to_value(),
                    "supplier_part": line.get("part").cloned().unwrap_or(Value::Null),
                    "quantity": outstanding,
                    "status": status,
                    "location": location,
                }));
            }
        }

        if items.is_empty() {
            return Ok(None);
        }

        let response = self
            .post_action("receive", json!({ "items": items, "location": location }))
            .await?;
        self.reload().await?;

        Ok(Some(response))
    }
}

impl PurchaseOrderLineItem {
    /// Ordered quantity
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// Quantity received so far
    pub fn received(&self) -> Option<f64> {
        self.f64_field("received")
    }

    /// Quantity not yet received
    pub fn outstanding(&self) -> f64 {
        self.quantity().unwrap_or(0.0) - self.received().unwrap_or(0.0)
    }

    /// The supplier part ordered
    pub async fn supplier_part(&self) -> Result<SupplierPart, InvenTreeError> {
        self.related_required("part").await
    }

    /// The internal part behind the supplier part
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.supplier_part().await?.part().await
    }

    /// The order this line belongs to
    pub async fn order(&self) -> Result<PurchaseOrder, InvenTreeError> {
        self.related_required("order").await
    }

    /// Mark this line as received
    ///
    /// By default every outstanding unit is received into the line's
    /// destination with status OK.
    pub async fn receive(&mut self, options: ReceiveOptions) -> Result<Value, InvenTreeError> {
        let quantity = options.quantity.unwrap_or_else(|| self.outstanding());
        let location = match options.location {
            Some(location) => Value::from(location),
            None => self.get("destination").cloned().unwrap_or(Value::Null),
        };

        let mut item = Map::new();
        item.insert("line_item".to_string(), self.pk().to_value());
        item.insert("supplier_part".to_string(), self.field("part")?.clone());
        item.insert("quantity".to_string(), json!(quantity));
        item.insert("status".to_string(), Value::from(options.status));
        item.insert("location".to_string(), location.clone());

        if let Some(expiry_date) = options.expiry_date {
            item.insert("expiry_date".to_string(), Value::from(expiry_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(batch_code) = options.batch_code.filter(|b| !b.is_empty()) {
            item.insert("batch_code".to_string(), Value::from(batch_code));
        }
        if let Some(serial_numbers) = options.serial_numbers.filter(|s| !s.is_empty()) {
            item.insert("serial_numbers".to_string(), Value::from(serial_numbers));
        }

        let order = self
            .u64_field("order")
            .ok_or_else(|| InvenTreeError::KeyNotFound("order".to_string()))?;
        let url = format!("{}{}/receive/", PurchaseOrderModel::collection_url(), order);

        let response = self
            .api()
            .post(&url, json!({ "items": [Value::Object(item)], "location": location }))
            .await?;
        self.reload().await?;

        Ok(response)
    }
}

impl PurchaseOrderExtraLineItem {
    /// The order this line belongs to
    pub async fn order(&self) -> Result<PurchaseOrder, InvenTreeError> {
        self.related_required("order").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Method;
    use crate::inventree_trait::SharedClient;
    use crate::mock::MockInvenTreeClient;
    use std::sync::Arc;

    fn setup() -> (MockInvenTreeClient, SharedClient) {
        let mock = MockInvenTreeClient::new("http://inventree.local");
        mock.insert("order/po", json!({"pk": 1, "reference": "PO-0001", "supplier": 2, "status": 10}));
        mock.insert(
            "order/po-line",
            json!({"pk": 11, "order": 1, "part": 5, "quantity": 10, "received": 4, "destination": 3}),
        );
        mock.insert(
            "order/po-line",
            json!({"pk": 12, "order": 1, "part": 6, "quantity": 2, "received": 2, "destination": null}),
        );
        mock.stub(Method::Post, "order/po/1/receive/", 201, json!({"items": []}));
        let api: SharedClient = Arc::new(mock.clone());
        (mock, api)
    }

    #[tokio::test]
    async fn test_receive_all_skips_completed_lines() {
        let (mock, api) = setup();
        let mut order = PurchaseOrder::with_pk(&api, 1).await.expect("order");
        assert_eq!(order.order_reference(), Some("PO-0001"));

        order.receive_all(7, STOCK_STATUS_OK).await.expect("receive").expect("something to receive");

        let receive = mock
            .requests()
            .into_iter()
            .find(|r| r.endpoint == "order/po/1/receive/")
            .expect("receive request");
        assert_eq!(
            receive.json,
            Some(json!({
                "items": [{"line_item": 11, "supplier_part": 5, "quantity": 6.0, "status": 10, "location": 7}],
                "location": 7,
            }))
        );
    }

    #[tokio::test]
    async fn test_line_receive_defaults_to_destination() {
        let (mock, api) = setup();
        let mut line = PurchaseOrderLineItem::with_pk(&api, 11).await.expect("line");

        let options = ReceiveOptions {
            quantity: Some(1.0),
            batch_code: Some("LOT-7".to_string()),
            expiry_date: chrono::NaiveDate::from_ymd_opt(2027, 3, 1),
            ..ReceiveOptions::default()
        };
        line.receive(options).await.expect("receive");

        let receive = mock
            .requests()
            .into_iter()
            .find(|r| r.endpoint == "order/po/1/receive/")
            .expect("receive request");
        let body = receive.json.expect("body");
        assert_eq!(body["location"], json!(3));
        assert_eq!(body["items"][0]["quantity"], json!(1.0));
        assert_eq!(body["items"][0]["batch_code"], json!("LOT-7"));
        assert_eq!(body["items"][0]["expiry_date"], json!("2027-03-01"));
    }

    #[tokio::test]
    async fn test_status_actions_post_and_reload() {
        let (mock, api) = setup();
        mock.stub(Method::Post, "order/po/1/issue/", 201, json!({}));
        let mut order = PurchaseOrder::with_pk(&api, 1).await.expect("order");

        order.issue().await.expect("issue");

        let endpoints: Vec<String> = mock.requests().into_iter().map(|r| r.endpoint).collect();
        assert_eq!(endpoints, vec!["order/po/1/", "order/po/1/issue/", "order/po/1/"]);
    }

    #[tokio::test]
    async fn test_invalid_status_makes_no_request() {
        let (mock, api) = setup();
        let mut order = PurchaseOrder::with_pk(&api, 1).await.expect("order");
        mock.clear_requests();

        let err = order
            .status_update_named("teleport", None, true)
            .await
            .expect_err("not a status");
        assert!(matches!(err, InvenTreeError::InvalidStatus(_)));
        assert!(mock.requests().is_empty());
    }
}
