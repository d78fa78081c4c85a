//! Sales orders, shipments and stock allocations

use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use super::{Company, Contact, Model, Part, StockItem, model, order_status_helpers};
use crate::error::InvenTreeError;
use crate::mixins::{Attachments, Metadata, ReportPrinting, Status, StatusAction};

model! {
    /// Sales order
    SalesOrder(SalesOrderModel) => "order/so", model_type = "salesorder"
}

model! {
    /// Sales order line (a part and quantity)
    SalesOrderLineItem(SalesOrderLineItemModel) => "order/so-line"
}

model! {
    /// Sales order line not tied to a part
    SalesOrderExtraLineItem(SalesOrderExtraLineItemModel) => "order/so-extra-line"
}

model! {
    /// Stock item allocated against a sales order line
    SalesOrderAllocation(SalesOrderAllocationModel) => "order/so-allocation", min_api = 267
}

model! {
    /// Shipment of a sales order
    SalesOrderShipment(SalesOrderShipmentModel) => "order/so/shipment"
}

impl Metadata for SalesOrderModel {}
impl Metadata for SalesOrderLineItemModel {}
impl Metadata for SalesOrderExtraLineItemModel {}
impl Metadata for SalesOrderShipmentModel {}
impl Attachments for SalesOrderModel {}
impl Status for SalesOrderModel {}
impl Status for SalesOrderShipmentModel {}

impl ReportPrinting for SalesOrderModel {
    const REPORT_NAME: &'static str = "so";
    const REPORT_ITEM: &'static str = "order";
}

order_status_helpers!(SalesOrder);

impl SalesOrder {
    /// The customer company
    pub async fn customer(&self) -> Result<Company, InvenTreeError> {
        self.related_required("customer").await
    }

    /// The customer contact, if set
    pub async fn contact(&self) -> Result<Option<Contact>, InvenTreeError> {
        self.related("contact").await
    }

    /// Line items of this order
    pub async fn line_items(&self, filters: &[(&str, &str)]) -> Result<Vec<SalesOrderLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Extra line items of this order
    pub async fn extra_line_items(&self, filters: &[(&str, &str)]) -> Result<Vec<SalesOrderExtraLineItem>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Create a line item against this order
    pub async fn add_line_item(&self, mut data: Map<String, Value>) -> Result<SalesOrderLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        SalesOrderLineItem::create(self.api(), data).await
    }

    /// Create an extra line item against this order
    pub async fn add_extra_line_item(&self, mut data: Map<String, Value>) -> Result<SalesOrderExtraLineItem, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        SalesOrderExtraLineItem::create(self.api(), data).await
    }

    /// Shipments of this order
    pub async fn shipments(&self, filters: &[(&str, &str)]) -> Result<Vec<SalesOrderShipment>, InvenTreeError> {
        self.children("order", filters).await
    }

    /// Create a new shipment for this order
    pub async fn add_shipment(
        &self,
        reference: &str,
        mut data: Map<String, Value>,
    ) -> Result<SalesOrderShipment, InvenTreeError> {
        data.insert("order".to_string(), self.pk().to_value());
        data.insert("reference".to_string(), Value::from(reference));
        SalesOrderShipment::create(self.api(), data).await
    }
}

impl SalesOrderLineItem {
    /// Ordered quantity
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// Quantity already allocated from stock
    pub fn allocated(&self) -> Option<f64> {
        self.f64_field("allocated")
    }

    /// The part sold
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }

    /// The order this line belongs to
    pub async fn order(&self) -> Result<SalesOrder, InvenTreeError> {
        self.related_required("order").await
    }
}

impl SalesOrderExtraLineItem {
    /// The order this line belongs to
    pub async fn order(&self) -> Result<SalesOrder, InvenTreeError> {
        self.related_required("order").await
    }
}

impl SalesOrderAllocation {
    /// Allocated quantity
    pub fn quantity(&self) -> Option<f64> {
        self.f64_field("quantity")
    }

    /// The order the allocation belongs to
    pub async fn order(&self) -> Result<SalesOrder, InvenTreeError> {
        self.related_required("order").await
    }

    /// The shipment the stock is packed in, if assigned
    pub async fn shipment(&self) -> Result<Option<SalesOrderShipment>, InvenTreeError> {
        self.related("shipment").await
    }

    /// The order line being fulfilled
    pub async fn line_item(&self) -> Result<SalesOrderLineItem, InvenTreeError> {
        self.related_required("line").await
    }

    /// The allocated stock item
    pub async fn stock_item(&self) -> Result<StockItem, InvenTreeError> {
        self.related_required("item").await
    }

    /// The part of the allocated stock
    pub async fn part(&self) -> Result<Part, InvenTreeError> {
        self.related_required("part").await
    }
}

/// Details recorded when a shipment is sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentDetails {
    /// Date shipped; the server uses today when omitted
    pub shipment_date: Option<NaiveDate>,
    pub tracking_number: String,
    pub invoice_number: String,
    pub link: String,
}

impl ShipmentDetails {
    fn into_body(self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(
            "shipment_date".to_string(),
            self.shipment_date
                .map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
        );
        body.insert("tracking_number".to_string(), Value::from(self.tracking_number));
        body.insert("invoice_number".to_string(), Value::from(self.invoice_number));
        body.insert("link".to_string(), Value::from(self.link));
        body
    }
}

impl SalesOrderShipment {
    /// Shipment reference
    pub fn shipment_reference(&self) -> Option<&str> {
        self.str_field("reference")
    }

    /// The order being shipped
    pub async fn order(&self) -> Result<SalesOrder, InvenTreeError> {
        self.related_required("order").await
    }

    /// Allocate stock to this shipment
    ///
    /// Each item is an object with `line_item`, `stock_item` and `quantity`.
    pub async fn allocate_items(&mut self, items: Vec<Value>) -> Result<Value, InvenTreeError> {
        let order = self
            .u64_field("order")
            .ok_or_else(|| InvenTreeError::KeyNotFound("order".to_string()))?;
        let url = format!("{}{}/allocate/", SalesOrderModel::collection_url(), order);

        let response = self
            .api()
            .post(&url, json!({ "items": items, "shipment": self.pk().to_value() }))
            .await?;
        self.reload().await?;

        Ok(response)
    }

    /// Allocations packed in this shipment
    pub async fn allocations(&self) -> Result<Vec<SalesOrderAllocation>, InvenTreeError> {
        self.children("shipment", &[]).await
    }

    /// Mark the shipment as sent
    pub async fn complete(&mut self, details: ShipmentDetails) -> Result<Value, InvenTreeError> {
        self.status_update(StatusAction::Ship, Some(details.into_body()), true)
            .await
    }

    /// Alias for [`SalesOrderShipment::complete`]
    pub async fn ship(&mut self, details: ShipmentDetails) -> Result<Value, InvenTreeError> {
        self.complete(details).await
    }
}
